//! Link expiry gate.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExpiryError {
    #[error("Invalid expire value: {0}")]
    Format(String),

    #[error("Link expired at {deadline}")]
    Expired { deadline: DateTime<Utc> },
}

/// ## Summary
/// Parses an `expire` value (UNIX epoch seconds) into a deadline.
///
/// ## Errors
/// Returns `ExpiryError::Format` if the value is not an integer or is out of range.
pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, ExpiryError> {
    let seconds: i64 = raw
        .parse()
        .map_err(|_err| ExpiryError::Format(raw.to_string()))?;
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| ExpiryError::Format(raw.to_string()))
}

/// ## Summary
/// Rejects a request whose deadline lies strictly before `now`.
///
/// A missing value never expires. A deadline equal to `now` still passes.
///
/// ## Errors
/// Returns `ExpiryError::Format` for a non-numeric value and
/// `ExpiryError::Expired` once `now` is past the deadline.
pub fn check_not_expired(expire: Option<&str>, now: DateTime<Utc>) -> Result<(), ExpiryError> {
    let Some(raw) = expire else {
        return Ok(());
    };

    let deadline = parse_deadline(raw)?;
    if now > deadline {
        return Err(ExpiryError::Expired { deadline });
    }
    Ok(())
}
