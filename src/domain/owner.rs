use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Integer identifier of a client or a service, assigned by the store.
pub type OwnerId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: OwnerId,
    pub login: String,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// A payee (utility, tax office, ...) that customers pay bills to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: OwnerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
