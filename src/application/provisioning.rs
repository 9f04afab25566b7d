use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::domain::{Account, MAX_ACCOUNT_NUMBER, OwnerId, OwnerKind, ServiceNumberError};
use crate::storage::accounts;

use super::AppError;
use super::service::{BankService, commit_or_rollback};

impl BankService {
    /// Open a new zero-balance account for an existing client or service.
    ///
    /// Accounts are numbered 0, 1, 2, ... per owner in creation order. The
    /// count and the insert share one transaction, and the schema's
    /// `UNIQUE(owner, account_number)` rejects a concurrent duplicate.
    pub async fn provision_account(
        &self,
        owner_id: OwnerId,
        kind: OwnerKind,
    ) -> Result<Account, AppError> {
        let mut tx = self.repo.begin().await?;
        let result = provision_in(&mut *tx, owner_id, kind).await;
        let account = commit_or_rollback(tx, result, "account provisioning").await?;

        info!(
            owner_kind = %kind,
            owner_id,
            account_number = account.account_number,
            account_id = %account.id,
            "Provisioned account"
        );
        Ok(account)
    }
}

/// Provision inside an already open transaction.
pub(super) async fn provision_in(
    conn: &mut SqliteConnection,
    owner_id: OwnerId,
    kind: OwnerKind,
) -> Result<Account, AppError> {
    if !accounts::owner_exists(conn, kind, owner_id).await? {
        return Err(AppError::owner_not_found(kind, owner_id));
    }

    let next_number = accounts::count_accounts(conn, kind, owner_id).await?;
    debug!(owner_kind = %kind, owner_id, next_number, "Counted existing accounts");

    // A service account past 9999 could never be reached by a service number.
    if kind == OwnerKind::Service && next_number > MAX_ACCOUNT_NUMBER {
        return Err(ServiceNumberError::OutOfRange {
            field: "account number",
            value: next_number,
            max: MAX_ACCOUNT_NUMBER,
        }
        .into());
    }

    let account = Account::new(owner_id, kind, next_number);
    accounts::insert_account(conn, &account).await?;
    Ok(account)
}
