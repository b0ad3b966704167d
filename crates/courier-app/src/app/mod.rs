pub mod api;

use std::sync::Arc;

use courier_service::gateway::DownloadGateway;
use salvo::Router;
use salvo::logging::Logger;

use crate::gateway_handler::GatewayHandler;

/// ## Summary
/// Builds the full application router around a shared gateway.
#[must_use]
pub fn router(gateway: Arc<DownloadGateway>) -> Router {
    Router::new()
        .hoop(Logger::new())
        .hoop(GatewayHandler { gateway })
        .push(api::routes())
}
