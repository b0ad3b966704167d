//! Authorization and streaming-proxy pipeline for the courier download gateway.
//!
//! A download request flows through these stages, each returning its own error type:
//! 1. [`request::params`] resolves query parameters or an encrypted envelope into a
//!    [`request::params::RequestDescriptor`].
//! 2. [`request::expiry`] rejects links past their deadline.
//! 3. [`request::source`] classifies the source reference; local references are
//!    confined to the download root by [`request::path`].
//! 4. [`proxy`] streams the local file or upstream response and reports one
//!    [`proxy::transfer::TransferResult`] per transfer.
//!
//! [`gateway::DownloadGateway`] owns the immutable configuration and drives the stages.

pub mod crypto;
pub mod error;
pub mod gateway;
pub mod proxy;
pub mod request;
