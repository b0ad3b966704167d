use chrono::Utc;
use courier_core::constants::query;
use courier_service::request::params::QueryParams;
use salvo::{Depot, Request, Response, handler};

use crate::error::AppError;
use crate::gateway_handler::get_gateway_from_depot;
use crate::middleware::caller::get_caller_from_depot;

fn query_params(req: &Request) -> QueryParams {
    QueryParams {
        enc: req.query::<String>(query::ENVELOPE),
        url: req.query::<String>(query::URL),
        filename: req.query::<String>(query::FILENAME),
        expire: req.query::<String>(query::EXPIRE),
        sign: req.query::<String>(query::SIGN),
    }
}

/// ## Summary
/// GET /download - authorize the link, then stream the local file or upstream
/// resource back as an attachment.
///
/// ## Errors
/// Renders 400/403/404/500 or the upstream's own status before any body byte
/// is sent. Failures after streaming has started only truncate the body.
#[handler]
pub async fn fetch(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let gateway = match get_gateway_from_depot(depot) {
        Ok(gateway) => gateway,
        Err(e) => {
            e.render(res);
            return;
        }
    };

    let download = match gateway.authorize(query_params(req), Utc::now()).await {
        Ok(download) => download,
        Err(e) => {
            AppError::from(e).render(res);
            return;
        }
    };
    tracing::debug!(
        source = %download.descriptor.source(),
        origin = ?download.descriptor.origin(),
        "Download authorized"
    );

    let caller = get_caller_from_depot(depot);
    if let Err(e) = gateway.deliver(download, caller, req.headers(), res).await {
        AppError::from(e).render(res);
    }
}
