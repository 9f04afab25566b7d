//! Service numbers: the bill-payment reference shared with customers.
//!
//! A service number is the service id zero-padded to 9 digits followed by
//! the account number zero-padded to 4 digits, e.g. service 42, account 3
//! becomes `0000000420003`. Decoding only splits off the last 4 digits, so
//! shorter forms like `420003` are accepted as well.

use thiserror::Error;

use super::{AccountNumber, OwnerId};

/// Width of the trailing account-number field.
pub const ACCOUNT_DIGITS: usize = 4;

/// Width of the service-id field produced by [`encode`].
pub const SERVICE_ID_DIGITS: usize = 9;

pub const MAX_SERVICE_ID: OwnerId = 999_999_999;

/// Hard limit on accounts per service: a fifth digit cannot be encoded.
pub const MAX_ACCOUNT_NUMBER: AccountNumber = 9_999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceNumberError {
    #[error("malformed service number {token:?}: {reason}")]
    MalformedToken { token: String, reason: &'static str },

    #[error("{field} {value} is outside the encodable range 0..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        max: i64,
    },
}

fn check_range(field: &'static str, value: i64, max: i64) -> Result<(), ServiceNumberError> {
    if (0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ServiceNumberError::OutOfRange { field, value, max })
    }
}

/// Encode a service account address into its service number.
pub fn encode(
    service_id: OwnerId,
    account_number: AccountNumber,
) -> Result<String, ServiceNumberError> {
    check_range("service id", service_id, MAX_SERVICE_ID)?;
    check_range("account number", account_number, MAX_ACCOUNT_NUMBER)?;
    Ok(format!(
        "{:0id_width$}{:0acc_width$}",
        service_id,
        account_number,
        id_width = SERVICE_ID_DIGITS,
        acc_width = ACCOUNT_DIGITS,
    ))
}

/// Split a service number back into `(service_id, account_number)`.
pub fn decode(token: &str) -> Result<(OwnerId, AccountNumber), ServiceNumberError> {
    let malformed = |reason| ServiceNumberError::MalformedToken {
        token: token.to_string(),
        reason,
    };

    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("only decimal digits are allowed"));
    }
    if token.len() <= ACCOUNT_DIGITS {
        return Err(malformed("missing service id before the account digits"));
    }

    // All-ASCII, so byte offsets are char boundaries.
    let (service_str, account_str) = token.split_at(token.len() - ACCOUNT_DIGITS);

    let digits = service_str.trim_start_matches('0');
    if digits.len() > SERVICE_ID_DIGITS {
        return Err(ServiceNumberError::OutOfRange {
            field: "service id",
            value: digits.parse().unwrap_or(i64::MAX),
            max: MAX_SERVICE_ID,
        });
    }
    let service_id: OwnerId = if digits.is_empty() {
        0
    } else {
        digits
            .parse()
            .map_err(|_| malformed("service id is not a number"))?
    };
    let account_number: AccountNumber = account_str
        .parse()
        .map_err(|_| malformed("account number is not a number"))?;

    Ok((service_id, account_number))
}
