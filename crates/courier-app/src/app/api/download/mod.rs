//! `GET` fetches, `POST` prepares an envelope, anything else is 405.

mod fetch;
mod prepare;

use courier_core::constants::DOWNLOAD_ROUTE_COMPONENT;
use salvo::http::StatusCode;
use salvo::writing::Text;
use salvo::{Response, Router, handler};

use crate::middleware::caller::CallerMiddleware;

#[handler]
async fn method_not_allowed(res: &mut Response) {
    res.status_code(StatusCode::METHOD_NOT_ALLOWED);
    res.render(Text::Plain("Method Not Allowed"));
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(DOWNLOAD_ROUTE_COMPONENT)
        .hoop(CallerMiddleware)
        .get(fetch::fetch)
        .post(prepare::prepare)
        .goal(method_not_allowed)
}
