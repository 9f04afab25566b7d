use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, OwnerId, ServiceNumberError, service_number};

pub type AccountId = Uuid;

/// Owner-scoped sequential account number, starting at 0.
pub type AccountNumber = i64;

/// Which kind of entity owns an account. Client and service accounts live in
/// separate tables and are addressed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// A customer of the bank
    Client,
    /// A payee that receives bill payments
    Service,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Client => "client",
            OwnerKind::Service => "service",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "client" => Some(OwnerKind::Client),
            "service" => Some(OwnerKind::Service),
            _ => None,
        }
    }
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A balance record owned by exactly one client or service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner_id: OwnerId,
    pub owner_kind: OwnerKind,
    pub account_number: AccountNumber,
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A fresh account with a zero balance. The number must come from the
    /// provisioner, which counts the owner's existing accounts.
    pub fn new(owner_id: OwnerId, owner_kind: OwnerKind, account_number: AccountNumber) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            owner_kind,
            account_number,
            balance: 0,
            created_at: Utc::now(),
        }
    }

    /// The bill-payment reference for a service account. `None` for client accounts.
    pub fn service_number(&self) -> Option<Result<String, ServiceNumberError>> {
        match self.owner_kind {
            OwnerKind::Service => Some(service_number::encode(
                self.owner_id,
                self.account_number,
            )),
            OwnerKind::Client => None,
        }
    }
}
