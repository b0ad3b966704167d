pub mod headers;
pub mod local;
pub mod remote;
pub mod transfer;

pub use headers::{HeaderAllowList, content_disposition};
pub use remote::{MAX_REDIRECTS, ProxyError, UpstreamClient};
pub use transfer::{
    CallerInfo, MeteredStream, TracingObserver, TransferMeter, TransferObserver, TransferOutcome,
    TransferResult, describe_agent, meter_response_body,
};
