use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::domain::{AccountNumber, Cents, OwnerId, TransferRequest, service_number};
use crate::storage::accounts;

use super::AppError;
use super::service::{BankService, commit_or_rollback};

impl BankService {
    /// Move `request.amount` from a client account to a client or service
    /// account, atomically.
    ///
    /// Either both balances change or neither does. Transfers that leave the
    /// sender at exactly zero are allowed; anything beyond the balance is
    /// rejected with [`AppError::InsufficientFunds`]. A transfer to the same
    /// account is a no-op on its balance.
    pub async fn transfer(&self, request: TransferRequest) -> Result<(), AppError> {
        let sender = request.sender();
        let receiver = request.receiver();

        if request.amount < 1 {
            warn!(%sender, %receiver, amount = request.amount, "Rejected non-positive transfer");
            return Err(AppError::InvalidAmount(request.amount));
        }

        let mut tx = self.repo.begin().await?;
        let result = apply_transfer(&mut *tx, &request).await;
        if let Err(err) = &result {
            warn!(%sender, %receiver, amount = request.amount, error = %err, "Transfer rejected");
        }
        commit_or_rollback(tx, result, "transfer").await?;

        info!(
            %sender,
            %receiver,
            amount = request.amount,
            self_transfer = request.is_self_transfer(),
            "Transfer committed"
        );
        Ok(())
    }

    /// Pay a bill: decode the service number and transfer to that service account.
    pub async fn pay_bill(
        &self,
        token: &str,
        amount: Cents,
        payer_owner_id: OwnerId,
        payer_account_number: AccountNumber,
    ) -> Result<(), AppError> {
        let (service_id, account_number) = service_number::decode(token)?;
        debug!(token, service_id, account_number, "Decoded service number");

        self.transfer(TransferRequest::to_service(
            amount,
            (payer_owner_id, payer_account_number),
            (service_id, account_number),
        ))
        .await
    }
}

/// The debit/credit protocol. Runs on the caller's transaction; any error
/// leaves the transaction to be rolled back.
async fn apply_transfer(
    conn: &mut SqliteConnection,
    request: &TransferRequest,
) -> Result<(), AppError> {
    let amount = request.amount;
    let sender = request.sender();
    let receiver = request.receiver();

    let sender_balance = accounts::get_balance(conn, &sender)
        .await?
        .ok_or(AppError::AccountNotFound(sender))?;
    debug!(%sender, balance = sender_balance, "Read sender balance");

    if amount > sender_balance {
        return Err(AppError::InsufficientFunds {
            account: sender,
            balance: sender_balance,
            required: amount,
        });
    }

    // Conditional update: re-checks the balance in the same statement.
    if !accounts::debit_if_sufficient(conn, &sender, amount).await? {
        return Err(AppError::InsufficientFunds {
            account: sender,
            balance: sender_balance,
            required: amount,
        });
    }

    let receiver_balance = accounts::get_balance(conn, &receiver)
        .await?
        .ok_or(AppError::AccountNotFound(receiver))?;
    debug!(%receiver, balance = receiver_balance, "Read receiver balance");

    if receiver_balance.checked_add(amount).is_none() {
        return Err(AppError::BalanceOverflow(receiver));
    }
    if !accounts::credit(conn, &receiver, amount).await? {
        return Err(AppError::AccountNotFound(receiver));
    }

    Ok(())
}
