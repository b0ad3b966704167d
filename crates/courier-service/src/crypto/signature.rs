//! Shared-secret link signatures.
//!
//! `sign = md5(filename | url | expire | secret)` in lowercase hex, where empty
//! fields are dropped from the canonical string but the secret is always last.
//! MD5 is only used as a keyed tag here, never for confidentiality.

use thiserror::Error;

const SEPARATOR: &str = "|";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature mismatch")]
    Mismatch,
}

/// The signed subset of download parameters, in canonical order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedFields<'a> {
    pub filename: &'a str,
    pub url: &'a str,
    pub expire: &'a str,
}

impl<'a> SignedFields<'a> {
    /// ## Summary
    /// Returns the fields in signing order: filename, url, expire.
    #[must_use]
    pub fn ordered(&self) -> [&'a str; 3] {
        [self.filename, self.url, self.expire]
    }
}

/// ## Summary
/// Computes the lowercase hex fingerprint over the non-empty `fields` followed by `secret`.
#[must_use]
pub fn compute_fingerprint<'a>(
    fields: impl IntoIterator<Item = &'a str>,
    secret: &'a str,
) -> String {
    let canonical = fields
        .into_iter()
        .filter(|field| !field.is_empty())
        .chain(std::iter::once(secret))
        .collect::<Vec<_>>()
        .join(SEPARATOR);

    format!("{:x}", md5::compute(canonical.as_bytes()))
}

/// ## Summary
/// Checks a caller-supplied signature against the fingerprint of `fields`.
///
/// Comparison is case-insensitive.
///
/// ## Errors
/// Returns `SignatureError::Mismatch` when the signature does not match.
pub fn verify_signature(
    supplied: &str,
    fields: &SignedFields<'_>,
    secret: &str,
) -> Result<(), SignatureError> {
    let expected = compute_fingerprint(fields.ordered(), secret);
    if supplied.eq_ignore_ascii_case(&expected) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
