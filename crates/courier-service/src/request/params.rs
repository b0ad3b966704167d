//! Parameter resolution: turns a raw query (plain or envelope) into a
//! canonical [`RequestDescriptor`].

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use courier_core::constants::query;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::encoding::percent_encode;
use super::source::derive_filename;
use crate::crypto::{envelope, signature};

/// URL-safe base64 that emits no padding and accepts input with or without it.
pub const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug)]
pub enum ParamError {
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// Detail is for the operator log only.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Invalid signature")]
    InvalidSignature,
}

/// Download parameters as carried in a prepare body or an envelope payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadParams {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_integer"
    )]
    pub expire: Option<String>,
}

/// Body of the prepare (POST) flow. `sign` is the caller-chosen envelope key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrepareRequest {
    #[serde(flatten)]
    pub params: DownloadParams,
    #[serde(default)]
    pub sign: Option<String>,
}

/// Accepts `"1700000000"` and `1700000000` alike.
fn string_or_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Signed(n) => n.to_string(),
        Raw::Unsigned(n) => n.to_string(),
    }))
}

/// Raw download query. Empty values count as absent.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub enc: Option<String>,
    pub url: Option<String>,
    pub filename: Option<String>,
    pub expire: Option<String>,
    pub sign: Option<String>,
}

/// How the parameters of a request were authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamOrigin {
    Envelope,
    SignedQuery,
    /// No sign key configured.
    OpenQuery,
}

/// Canonical, immutable description of one download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    source: String,
    filename: String,
    expire: Option<String>,
    origin: ParamOrigin,
}

impl RequestDescriptor {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn expire(&self) -> Option<&str> {
        self.expire.as_deref()
    }

    #[must_use]
    pub fn origin(&self) -> ParamOrigin {
        self.origin
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// ## Summary
/// Decodes and decrypts an `enc` token with `secret` into download parameters.
///
/// ## Errors
/// Returns `ParamError::InvalidEnvelope` for any base64, decryption, or JSON failure.
pub fn open_envelope(token: &str, secret: &str) -> Result<DownloadParams, ParamError> {
    let sealed = TOKEN_ENGINE
        .decode(token)
        .map_err(|e| ParamError::InvalidEnvelope(format!("base64: {e}")))?;
    let plaintext = envelope::decrypt(secret, &sealed)
        .map_err(|e| ParamError::InvalidEnvelope(e.to_string()))?;
    serde_json::from_slice(&plaintext).map_err(|e| ParamError::InvalidEnvelope(format!("json: {e}")))
}

/// ## Summary
/// Encrypts download parameters under `key` and returns an `enc` token.
///
/// ## Errors
/// Returns an error if serialization or encryption fails.
pub fn seal_envelope(params: &DownloadParams, key: &str) -> Result<String, envelope::EnvelopeError> {
    let plaintext = serde_json::to_vec(params)
        .map_err(|e| envelope::EnvelopeError::Format(e.to_string()))?;
    let sealed = envelope::encrypt(key, &plaintext)?;
    Ok(TOKEN_ENGINE.encode(sealed))
}

/// ## Summary
/// Builds the query string of a signed plain link for `params`.
///
/// With an empty `secret` the `sign` field is left out (open mode).
#[must_use]
pub fn signed_query(params: &DownloadParams, secret: &str) -> String {
    let filename = params.filename.as_deref().unwrap_or_default();
    let expire = params.expire.as_deref().unwrap_or_default();

    let mut pairs = vec![(query::URL, params.url.clone())];
    if !filename.is_empty() {
        pairs.push((query::FILENAME, filename.to_string()));
    }
    if !expire.is_empty() {
        pairs.push((query::EXPIRE, expire.to_string()));
    }
    if !secret.is_empty() {
        let fields = signature::SignedFields {
            filename,
            url: &params.url,
            expire,
        };
        pairs.push((
            query::SIGN,
            signature::compute_fingerprint(fields.ordered(), secret),
        ));
    }

    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// ## Summary
/// Resolves a raw query into a [`RequestDescriptor`].
///
/// An `enc` token takes precedence and is decrypted with `secret`; its
/// authenticity stands in for a signature. Otherwise the plain fields are read
/// and, unless `secret` is empty, the `sign` field must match.
///
/// ## Errors
/// - `ParamError::InvalidEnvelope` if the token cannot be opened
/// - `ParamError::MissingUrl` if no source reference is present
/// - `ParamError::InvalidSignature` if the signature does not match
pub fn resolve(query: QueryParams, secret: &str) -> Result<RequestDescriptor, ParamError> {
    let (params, sign, origin) = match non_empty(query.enc) {
        Some(token) => (open_envelope(&token, secret)?, None, ParamOrigin::Envelope),
        None => {
            let origin = if secret.is_empty() {
                ParamOrigin::OpenQuery
            } else {
                ParamOrigin::SignedQuery
            };
            let params = DownloadParams {
                url: query.url.unwrap_or_default(),
                filename: query.filename,
                expire: query.expire,
            };
            (params, query.sign, origin)
        }
    };

    let filename = non_empty(params.filename);
    let expire = non_empty(params.expire);
    if params.url.is_empty() {
        return Err(ParamError::MissingUrl);
    }

    if origin == ParamOrigin::SignedQuery {
        let fields = signature::SignedFields {
            filename: filename.as_deref().unwrap_or_default(),
            url: &params.url,
            expire: expire.as_deref().unwrap_or_default(),
        };
        signature::verify_signature(sign.as_deref().unwrap_or_default(), &fields, secret)
            .map_err(|_err| ParamError::InvalidSignature)?;
    }

    let filename = filename.unwrap_or_else(|| derive_filename(&params.url));
    Ok(RequestDescriptor {
        source: params.url,
        filename,
        expire,
        origin,
    })
}
