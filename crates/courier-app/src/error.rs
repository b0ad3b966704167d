use salvo::Response;
use salvo::http::StatusCode;
use salvo::writing::Text;
use thiserror::Error;

use courier_core::error::CoreError;
use courier_service::error::{ErrorKind, ServiceError};

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    CoreError(#[from] CoreError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        let Self::ServiceError(err) = self else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match err.kind() {
            ErrorKind::Format | ErrorKind::Auth | ErrorKind::Path => StatusCode::BAD_REQUEST,
            ErrorKind::Expired => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Upstream(Some(status)) => status,
            ErrorKind::Upstream(None) | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to put in a response body.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::ServiceError(err) => err.public_message(),
            Self::CoreError(_) => "Internal server error".to_string(),
        }
    }

    /// ## Summary
    /// Logs the full error for the operator, then writes the status code and a
    /// short plain-text body.
    pub fn render(&self, res: &mut Response) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Download request failed");
        } else {
            tracing::warn!(error = %self, status = %status, "Download request rejected");
        }
        res.status_code(status);
        res.render(Text::Plain(self.public_message()));
    }
}
