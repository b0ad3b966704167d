mod download;
mod healthcheck;

use salvo::Router;

/// ## Summary
/// Constructs the API router: the download route and the health check.
#[must_use]
pub fn routes() -> Router {
    Router::new()
        .push(download::routes())
        .push(healthcheck::routes())
}
