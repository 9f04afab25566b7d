use thiserror::Error;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a human-readable decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("invalid money format: {0:?}")]
    InvalidFormat(String),

    #[error("too many decimal places in {0:?} (at most 2)")]
    TooPrecise(String),

    #[error("amount {0:?} is too large")]
    Overflow(String),
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let trimmed = input.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (units_str, fraction_str) = digits.split_once('.').unwrap_or((digits, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if (units_str.is_empty() && fraction_str.is_empty())
        || !all_digits(units_str)
        || !all_digits(fraction_str)
    {
        return Err(ParseCentsError::InvalidFormat(input.to_string()));
    }
    if fraction_str.len() > 2 {
        return Err(ParseCentsError::TooPrecise(input.to_string()));
    }

    let overflow = || ParseCentsError::Overflow(input.to_string());
    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| overflow())?
    };
    // "5" after the point means 50 cents
    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => fraction_str.parse::<i64>().map_err(|_| overflow())? * 10,
        _ => fraction_str.parse().map_err(|_| overflow())?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(overflow)?;
    Ok(if negative { -cents } else { cents })
}
