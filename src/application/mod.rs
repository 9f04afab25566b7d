// Application layer: the operations exposed to callers (CLI or an API).
// Each operation owns its transaction; the storage layer only runs statements.

pub mod error;
mod provisioning;
mod service;
mod transfer;

pub use error::*;
pub use service::*;
