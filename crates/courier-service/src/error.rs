use salvo::http::StatusCode;
use thiserror::Error;

use crate::crypto::EnvelopeError;
use crate::proxy::ProxyError;
use crate::request::expiry::ExpiryError;
use crate::request::params::ParamError;
use crate::request::path::PathError;
use crate::request::source::SourceError;

/// Service layer errors - one variant per pipeline stage
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    ParamError(#[from] ParamError),

    #[error(transparent)]
    ExpiryError(#[from] ExpiryError),

    #[error(transparent)]
    SourceError(#[from] SourceError),

    #[error(transparent)]
    PathError(#[from] PathError),

    #[error(transparent)]
    ProxyError(#[from] ProxyError),

    #[error(transparent)]
    EnvelopeError(#[from] EnvelopeError),

    #[error(transparent)]
    CoreError(#[from] courier_core::error::CoreError),

    #[error("Blocking task failed: {0}")]
    TaskError(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Caller-facing classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed JSON, base64, timestamp or URL.
    Format,
    /// Bad signature or envelope. Never says which.
    Auth,
    Expired,
    NotFound,
    /// Traversal attempt or not a regular file.
    Path,
    /// Carries the upstream status when there was one.
    Upstream(Option<StatusCode>),
    Internal,
}

impl ServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ParamError(ParamError::MissingUrl)
            | Self::ExpiryError(ExpiryError::Format(_))
            | Self::SourceError(_) => ErrorKind::Format,
            Self::ParamError(ParamError::InvalidEnvelope(_) | ParamError::InvalidSignature) => {
                ErrorKind::Auth
            }
            Self::ExpiryError(ExpiryError::Expired { .. }) => ErrorKind::Expired,
            Self::PathError(PathError::NotFound(_)) => ErrorKind::NotFound,
            Self::PathError(PathError::Empty | PathError::Traversal(_) | PathError::NotAFile(_)) => {
                ErrorKind::Path
            }
            Self::ProxyError(ProxyError::Status(status)) => ErrorKind::Upstream(Some(*status)),
            Self::ProxyError(ProxyError::TooManyRedirects | ProxyError::Connect(_)) => {
                ErrorKind::Upstream(None)
            }
            Self::PathError(PathError::Io { .. })
            | Self::ProxyError(ProxyError::Build(_) | ProxyError::Open(_))
            | Self::EnvelopeError(_)
            | Self::CoreError(_)
            | Self::TaskError(_) => ErrorKind::Internal,
        }
    }

    /// ## Summary
    /// Short message that is safe to show to the caller.
    ///
    /// Never includes filesystem paths, upstream URLs or crypto detail; the
    /// full error goes to the operator log instead.
    #[must_use]
    pub fn public_message(&self) -> String {
        let message = match self {
            Self::ParamError(ParamError::MissingUrl) => "Missing required parameter: url",
            Self::ParamError(ParamError::InvalidEnvelope(_)) => "Invalid enc",
            Self::ParamError(ParamError::InvalidSignature) => "Invalid sign",
            Self::ExpiryError(ExpiryError::Format(_)) => {
                "Invalid expire parameter: must be a valid UNIX timestamp"
            }
            Self::ExpiryError(ExpiryError::Expired { .. }) => "Link has expired",
            Self::SourceError(SourceError::InvalidUrl(_)) => "Failed to parse url",
            Self::SourceError(SourceError::UnsupportedScheme(_)) => "Invalid url",
            Self::PathError(PathError::Empty | PathError::Traversal(_)) => "Invalid file path",
            Self::PathError(PathError::NotAFile(_)) => "Requested path is not a file",
            Self::PathError(PathError::NotFound(_)) => "File not found",
            Self::PathError(PathError::Io { .. }) => "Unable to retrieve file info",
            Self::ProxyError(ProxyError::Status(status)) => {
                return format!("Request failed: {status}");
            }
            Self::ProxyError(ProxyError::TooManyRedirects) => "Too many redirects",
            Self::ProxyError(ProxyError::Connect(_)) => "Failed to send request",
            Self::ProxyError(ProxyError::Build(_)) => "Failed to create request",
            Self::ProxyError(ProxyError::Open(_)) => "Unable to open file",
            Self::EnvelopeError(_) => "Failed to encrypt data",
            Self::CoreError(_) | Self::TaskError(_) => "Internal server error",
        };
        message.to_string()
    }
}
