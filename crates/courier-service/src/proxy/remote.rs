//! Upstream HTTP client for remote sources.

use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode, Url};
use salvo::http::HeaderMap;
use thiserror::Error;

/// Redirect hops followed before a fetch fails.
pub const MAX_REDIRECTS: usize = 20;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Failed to build upstream client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Stopped after {MAX_REDIRECTS} redirects")]
    TooManyRedirects,

    #[error("Upstream request failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("Upstream responded with {0}")]
    Status(StatusCode),

    #[error("Unable to open file: {0}")]
    Open(String),
}

/// Shared, connection-pooling client used for every remote transfer.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    /// ## Summary
    /// Builds a client that follows up to [`MAX_REDIRECTS`] redirects and passes
    /// content encodings through untouched.
    ///
    /// ## Errors
    /// Returns `ProxyError::Build` if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, ProxyError> {
        // `previous` holds the original URL plus every hop already followed.
        let policy = Policy::custom(|attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .redirect(policy)
            .no_gzip()
            .build()
            .map_err(ProxyError::Build)?;
        Ok(Self { client })
    }

    /// ## Summary
    /// Issues a GET for `url` carrying only the already-filtered `headers`.
    ///
    /// A `304 Not Modified` answer to a conditional request counts as success.
    ///
    /// ## Errors
    /// - `ProxyError::TooManyRedirects` when the redirect bound is exceeded
    /// - `ProxyError::Connect` for connection and protocol failures
    /// - `ProxyError::Status` for any other non-2xx final status
    pub async fn fetch(&self, url: Url, headers: HeaderMap) -> Result<Response, ProxyError> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|err| {
                if err.is_redirect() {
                    ProxyError::TooManyRedirects
                } else {
                    ProxyError::Connect(err)
                }
            })?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_MODIFIED {
            Ok(response)
        } else {
            Err(ProxyError::Status(status))
        }
    }
}
