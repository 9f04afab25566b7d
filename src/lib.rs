pub mod application;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod storage;

pub use application::{AppError, BankService};
pub use domain::service_number::{decode as decode_service_number, encode as encode_service_number};
pub use domain::*;
pub use storage::Repository;
