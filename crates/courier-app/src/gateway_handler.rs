use std::sync::Arc;

use courier_core::error::CoreError;
use courier_service::gateway::DownloadGateway;
use salvo::async_trait;

use crate::error::AppResult;

/// Makes the shared [`DownloadGateway`] available to every handler.
pub struct GatewayHandler {
    pub gateway: Arc<DownloadGateway>,
}

#[async_trait]
impl salvo::Handler for GatewayHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.gateway.clone());
    }
}

/// ## Summary
/// Retrieves the download gateway from the depot.
///
/// ## Errors
/// Returns an error if the gateway is not found in the depot.
pub fn get_gateway_from_depot(depot: &salvo::Depot) -> AppResult<Arc<DownloadGateway>> {
    depot
        .obtain::<Arc<DownloadGateway>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Download gateway not found in depot").into())
}
