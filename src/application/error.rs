use thiserror::Error;

use crate::domain::{AccountRef, Cents, OwnerKind, ServiceNumberError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0} (must be at least 1)")]
    InvalidAmount(Cents),

    #[error("Insufficient funds in {account}: balance {balance}, required {required}")]
    InsufficientFunds {
        account: AccountRef,
        balance: Cents,
        required: Cents,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(AccountRef),

    #[error("{kind} not found: {key}")]
    OwnerNotFound { kind: OwnerKind, key: String },

    #[error("{kind} already exists: {key}")]
    OwnerAlreadyExists { kind: OwnerKind, key: String },

    #[error("Balance of {0} would overflow")]
    BalanceOverflow(AccountRef),

    #[error(transparent)]
    ServiceNumber(#[from] ServiceNumberError),

    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub(crate) fn owner_not_found(kind: OwnerKind, key: impl ToString) -> Self {
        AppError::OwnerNotFound {
            kind,
            key: key.to_string(),
        }
    }
}
