use courier_service::request::params::PrepareRequest;
use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, handler};
use serde::Serialize;

use crate::error::AppError;
use crate::gateway_handler::get_gateway_from_depot;

/// ## Summary
/// Prepare response payload: `data` holds the envelope token on success.
#[derive(Debug, Serialize)]
pub struct PrepareResponse {
    pub code: u16,
    pub msg: String,
    pub data: Option<String>,
}

fn render_json(res: &mut Response, status: StatusCode, msg: String, data: Option<String>) {
    res.status_code(status);
    res.render(Json(PrepareResponse {
        code: status.as_u16(),
        msg,
        data,
    }));
}

/// ## Summary
/// POST /download - encrypt `{url, filename?, expire?}` under the caller's own
/// `sign` key and return the token for a later `GET ?enc=`.
///
/// ## Errors
/// Returns HTTP 400 for an unreadable body or a missing url.
/// Returns HTTP 500 if encryption fails.
#[handler]
pub async fn prepare(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let gateway = match get_gateway_from_depot(depot) {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!(error = ?e, "Failed to get gateway from depot");
            render_json(res, e.status_code(), e.public_message(), None);
            return;
        }
    };

    let body: PrepareRequest = match req.payload().await.map(|bytes| serde_json::from_slice(bytes)) {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Failed to parse prepare request");
            render_json(res, StatusCode::BAD_REQUEST, "Invalid request body".to_string(), None);
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read prepare request");
            render_json(res, StatusCode::BAD_REQUEST, "Invalid request body".to_string(), None);
            return;
        }
    };

    match gateway.prepare(body).await {
        Ok(token) => render_json(res, StatusCode::OK, "success".to_string(), Some(token)),
        Err(e) => {
            let err = AppError::from(e);
            tracing::warn!(error = %err, "Prepare request failed");
            render_json(res, err.status_code(), err.public_message(), None);
        }
    }
}
