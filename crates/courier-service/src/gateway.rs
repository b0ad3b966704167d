//! The download gateway: authorizes a request, then delivers the bytes.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use courier_core::config::Settings;
use courier_core::error::CoreError;
use futures::StreamExt;
use reqwest::Url;
use salvo::Response;
use salvo::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderValue};
use salvo::http::StatusCode;
use zeroize::Zeroizing;

use crate::error::{ServiceError, ServiceResult};
use crate::proxy::local::{self, OCTET_STREAM};
use crate::proxy::{
    CallerInfo, HeaderAllowList, MeteredStream, TransferMeter, TransferObserver, UpstreamClient,
    content_disposition, meter_response_body,
};
use crate::request::expiry::check_not_expired;
use crate::request::params::{self, PrepareRequest, QueryParams, RequestDescriptor};
use crate::request::path::{resolve_local_path, servable_metadata};
use crate::request::source::{Source, classify};

/// Immutable gateway configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Server secret. Empty means open mode.
    pub secret: Zeroizing<String>,
    /// Root that `file://` references are confined to.
    pub download_root: PathBuf,
    pub request_allow: HeaderAllowList,
    pub response_allow: HeaderAllowList,
}

impl GatewayConfig {
    /// ## Summary
    /// Builds the gateway configuration from loaded settings.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if a configured header name is invalid.
    pub fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        let parse = |names: Option<&Vec<String>>, default: fn() -> HeaderAllowList| {
            names.map_or_else(
                || Ok(default()),
                |names| {
                    HeaderAllowList::parse(names)
                        .map_err(|e| CoreError::ConfigError(format!("Invalid header name: {e}")))
                },
            )
        };

        Ok(Self {
            secret: Zeroizing::new(settings.download.sign_key.clone()),
            download_root: PathBuf::from(&settings.download.dir),
            request_allow: parse(
                settings.headers.request_allow.as_ref(),
                HeaderAllowList::default_request,
            )?,
            response_allow: parse(
                settings.headers.response_allow.as_ref(),
                HeaderAllowList::default_response,
            )?,
        })
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("open_mode", &self.secret.is_empty())
            .field("download_root", &self.download_root)
            .field("request_allow", &self.request_allow)
            .field("response_allow", &self.response_allow)
            .finish()
    }
}

/// Where an authorized download reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Remote(Url),
    /// Resolved path under the download root, known to be a regular file.
    Local(PathBuf),
}

/// A request that passed every authorization stage.
#[derive(Debug, Clone)]
pub struct AuthorizedDownload {
    pub descriptor: RequestDescriptor,
    pub target: Target,
}

/// Drives the parameter, expiry, path and proxy stages for each request.
///
/// Holds only read-only state plus the upstream connection pool and is shared
/// across all requests.
pub struct DownloadGateway {
    config: GatewayConfig,
    upstream: UpstreamClient,
    observer: Arc<dyn TransferObserver>,
}

impl DownloadGateway {
    /// ## Errors
    /// Returns an error if the upstream HTTP client cannot be built.
    pub fn new(config: GatewayConfig, observer: Arc<dyn TransferObserver>) -> ServiceResult<Self> {
        Ok(Self {
            config,
            upstream: UpstreamClient::new()?,
            observer,
        })
    }

    /// ## Errors
    /// Returns an error if the settings are invalid or the client cannot be built.
    pub fn from_settings(
        settings: &Settings,
        observer: Arc<dyn TransferObserver>,
    ) -> ServiceResult<Self> {
        Self::new(GatewayConfig::from_settings(settings)?, observer)
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Signatures are not checked when no secret is configured.
    #[must_use]
    pub fn is_open_mode(&self) -> bool {
        self.config.secret.is_empty()
    }

    /// ## Summary
    /// Encrypts the request's download parameters under its own `sign` key and
    /// returns the URL-safe token. The key itself is never part of the token.
    ///
    /// ## Errors
    /// - `ParamError::MissingUrl` if the body carries no url
    /// - `EnvelopeError` if encryption fails
    pub async fn prepare(&self, request: PrepareRequest) -> ServiceResult<String> {
        if request.params.url.is_empty() {
            return Err(params::ParamError::MissingUrl.into());
        }

        let key = Zeroizing::new(request.sign.unwrap_or_default());
        let payload = request.params;
        let token = tokio::task::spawn_blocking(move || params::seal_envelope(&payload, &key))
            .await
            .map_err(|e| ServiceError::TaskError(e.to_string()))??;
        Ok(token)
    }

    /// ## Summary
    /// Runs every check that must pass before a single byte is read: parameter
    /// resolution (signature or envelope), expiry, scheme, and for local
    /// sources path confinement and file type.
    ///
    /// ## Errors
    /// Returns the error of the first stage that rejects the request.
    pub async fn authorize(
        &self,
        query: QueryParams,
        now: DateTime<Utc>,
    ) -> ServiceResult<AuthorizedDownload> {
        let secret = self.config.secret.clone();
        let descriptor = tokio::task::spawn_blocking(move || params::resolve(query, &secret))
            .await
            .map_err(|e| ServiceError::TaskError(e.to_string()))?
            .inspect_err(|err| tracing::warn!("Rejected download parameters: {err}"))?;

        check_not_expired(descriptor.expire(), now)?;

        let target = match classify(descriptor.source())? {
            Source::Remote(url) => Target::Remote(url),
            Source::Local(raw) => {
                let path = resolve_local_path(&self.config.download_root, &raw)
                    .inspect_err(|err| tracing::warn!("Rejected local reference: {err}"))?;
                servable_metadata(&path).await?;
                Target::Local(path)
            }
        };

        Ok(AuthorizedDownload { descriptor, target })
    }

    /// ## Summary
    /// Writes the authorized resource to `res`.
    ///
    /// Errors returned from here happen before any response header is
    /// committed. Once streaming starts, failures only end the body early and
    /// are reported through the transfer observer.
    ///
    /// ## Errors
    /// Returns `ProxyError` if the file cannot be opened or the upstream fetch fails.
    pub async fn deliver(
        &self,
        download: AuthorizedDownload,
        caller: CallerInfo,
        request_headers: &HeaderMap,
        res: &mut Response,
    ) -> ServiceResult<()> {
        let AuthorizedDownload { descriptor, target } = download;

        match target {
            Target::Local(path) => {
                local::serve_file(&path, descriptor.filename(), request_headers, res).await?;
                // 304, 412 and 416 carry no file bytes.
                if res.status_code.is_some_and(|status| !status.is_success()) {
                    return Ok(());
                }
                meter_response_body(res, self.meter(&descriptor, caller));
            }
            Target::Remote(url) => {
                let forwarded = self.config.request_allow.filter(request_headers);
                let upstream = self.upstream.fetch(url, forwarded).await?;
                let status = upstream.status();

                res.status_code(status);
                let headers = res.headers_mut();
                for (name, value) in &self.config.response_allow.filter(upstream.headers()) {
                    headers.append(name.clone(), value.clone());
                }
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
                }
                headers.insert(
                    CONTENT_DISPOSITION,
                    content_disposition(descriptor.filename()),
                );

                if status == StatusCode::NOT_MODIFIED {
                    return Ok(());
                }

                let meter = self.meter(&descriptor, caller);
                res.stream(MeteredStream::new(upstream.bytes_stream().boxed(), meter));
            }
        }
        Ok(())
    }

    fn meter(&self, descriptor: &RequestDescriptor, caller: CallerInfo) -> TransferMeter {
        TransferMeter::new(
            self.observer.clone(),
            descriptor.source().to_string(),
            descriptor.filename().to_string(),
            caller,
        )
    }
}
