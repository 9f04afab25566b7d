mod account;
mod money;
mod owner;
pub mod service_number;
mod transfer;

pub use account::*;
pub use money::*;
pub use owner::*;
pub use service_number::{MAX_ACCOUNT_NUMBER, MAX_SERVICE_ID, ServiceNumberError};
pub use transfer::*;
