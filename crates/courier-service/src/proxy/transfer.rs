//! Transfer accounting: exactly one [`TransferResult`] per transfer that got
//! past its response headers.

use std::fmt;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use courier_core::util::size::format_bytes;
use futures::{Stream, StreamExt, future};
use salvo::Response;
use salvo::http::header::{HeaderMap, USER_AGENT};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Who asked for a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerInfo {
    /// Empty when no address could be determined.
    pub address: String,
    pub agent: String,
}

impl CallerInfo {
    /// ## Summary
    /// Picks the caller address from the first `X-Forwarded-For` entry, then
    /// `X-Real-IP`, then the socket peer.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, peer: Option<IpAddr>) -> Self {
        let address = header_text(headers, X_FORWARDED_FOR)
            .and_then(|list| list.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty())
            .or_else(|| header_text(headers, X_REAL_IP))
            .map(str::to_string)
            .or_else(|| peer.map(|ip| ip.to_string()))
            .unwrap_or_default();

        let agent = headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self { address, agent }
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,
    /// Failed or cancelled after the response headers were committed.
    Aborted,
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    pub bytes_written: u64,
    pub source: String,
    pub filename: String,
    pub caller: CallerInfo,
    pub outcome: TransferOutcome,
}

/// Consumer of finished transfers.
pub trait TransferObserver: Send + Sync {
    fn on_transfer(&self, result: &TransferResult);
}

/// ## Summary
/// Condenses a `User-Agent` header into `OS/Browser(version)` for the
/// transfer log, e.g. `Windows 10/Chrome(120.0.0.0)`.
///
/// Empty or unrecognised agents yield `unknown`.
#[must_use]
pub fn describe_agent(agent: &str) -> String {
    if agent.is_empty() {
        return "unknown".to_string();
    }
    woothee::parser::Parser::new()
        .parse(agent)
        .map_or_else(
            || "unknown".to_string(),
            |parsed| format!("{}/{}({})", parsed.os, parsed.name, parsed.version),
        )
}

/// Emits one structured `info` event per transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TransferObserver for TracingObserver {
    fn on_transfer(&self, result: &TransferResult) {
        tracing::info!(
            source = %result.source,
            filename = %result.filename,
            bytes = result.bytes_written,
            size = %format_bytes(result.bytes_written),
            ip = %result.caller.address,
            client = %describe_agent(&result.caller.agent),
            user_agent = %result.caller.agent,
            outcome = %result.outcome,
            "Transfer finished"
        );
    }
}

/// Counts bytes for one transfer and reports it exactly once, at the latest
/// when dropped.
pub struct TransferMeter {
    observer: Arc<dyn TransferObserver>,
    source: String,
    filename: String,
    caller: CallerInfo,
    bytes_written: u64,
    reported: bool,
}

impl TransferMeter {
    #[must_use]
    pub fn new(
        observer: Arc<dyn TransferObserver>,
        source: String,
        filename: String,
        caller: CallerInfo,
    ) -> Self {
        Self {
            observer,
            source,
            filename,
            caller,
            bytes_written: 0,
            reported: false,
        }
    }

    pub fn record(&mut self, bytes: u64) {
        self.bytes_written = self.bytes_written.saturating_add(bytes);
    }

    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn finish(mut self, outcome: TransferOutcome) {
        self.report(outcome);
    }

    fn report(&mut self, outcome: TransferOutcome) {
        if self.reported {
            return;
        }
        self.reported = true;
        self.observer.on_transfer(&TransferResult {
            bytes_written: self.bytes_written,
            source: std::mem::take(&mut self.source),
            filename: std::mem::take(&mut self.filename),
            caller: std::mem::take(&mut self.caller),
            outcome,
        });
    }
}

impl Drop for TransferMeter {
    fn drop(&mut self) {
        self.report(TransferOutcome::Aborted);
    }
}

/// Body stream wrapper that feeds a [`TransferMeter`].
///
/// The end of the inner stream reports `Completed`. An error chunk, or the
/// response being dropped early (client disconnect), reports `Aborted`.
pub struct MeteredStream<S> {
    inner: S,
    meter: Option<TransferMeter>,
}

impl<S> MeteredStream<S> {
    #[must_use]
    pub fn new(inner: S, meter: TransferMeter) -> Self {
        Self {
            inner,
            meter: Some(meter),
        }
    }
}

impl<S, E> Stream for MeteredStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = this.inner.poll_next_unpin(cx);

        match &polled {
            Poll::Ready(Some(Ok(chunk))) => {
                if let Some(meter) = this.meter.as_mut() {
                    meter.record(chunk.len() as u64);
                }
            }
            Poll::Ready(Some(Err(err))) => {
                if let Some(meter) = this.meter.take() {
                    tracing::warn!(
                        source = %meter.source,
                        bytes = meter.bytes_written(),
                        "Transfer aborted mid-stream: {err}"
                    );
                    meter.finish(TransferOutcome::Aborted);
                }
            }
            Poll::Ready(None) => {
                if let Some(meter) = this.meter.take() {
                    meter.finish(TransferOutcome::Completed);
                }
            }
            Poll::Pending => {}
        }

        polled
    }
}

/// ## Summary
/// Replaces the body already set on `res` with a [`MeteredStream`] over its
/// data frames, so the transfer is reported only as it is actually sent.
pub fn meter_response_body(res: &mut Response, meter: TransferMeter) {
    let data = res.take_body().filter_map(|frame| {
        future::ready(match frame {
            Ok(frame) => frame.into_data().ok().map(Ok),
            Err(err) => Some(Err(err)),
        })
    });
    res.stream(MeteredStream::new(data.boxed(), meter));
}
