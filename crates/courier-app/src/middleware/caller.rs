use courier_service::proxy::CallerInfo;
use salvo::Depot;

/// ## Summary
/// Records who is calling (address and user agent) in the depot so the
/// transfer log can name the caller.
pub struct CallerMiddleware;

#[salvo::async_trait]
impl salvo::Handler for CallerMiddleware {
    #[tracing::instrument(skip(self, req, depot, _res, _ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        let peer = req.remote_addr().clone().into_std().map(|addr| addr.ip());
        let caller = CallerInfo::from_headers(req.headers(), peer);
        tracing::trace!(address = %caller.address, "Identified caller");
        depot.inject(caller);
    }
}

/// ## Summary
/// Returns the caller recorded by [`CallerMiddleware`], or an anonymous caller.
#[must_use]
pub fn get_caller_from_depot(depot: &Depot) -> CallerInfo {
    depot.obtain::<CallerInfo>().cloned().unwrap_or_default()
}
