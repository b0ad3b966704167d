#![allow(clippy::unused_async, clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Provides utilities for:
//! - Building a gateway service over a temporary download root
//! - Recording every transfer the gateway reports
//! - Running a loopback upstream server for remote downloads
//! - Making HTTP requests and asserting on responses

use std::path::Path;
use std::sync::{Arc, Mutex};

use salvo::conn::{Acceptor, TcpListener};
use salvo::http::header::HeaderName;
use salvo::http::{Method, ReqBody, StatusCode};
use salvo::prelude::*;
use salvo::test::{RequestBuilder, ResponseExt, TestClient};
use tempfile::TempDir;

use courier_test::app::app::router;
use courier_test::component::gateway::{DownloadGateway, GatewayConfig};
use courier_test::component::proxy::{
    HeaderAllowList, TransferObserver, TransferResult,
};
use courier_test::component::request::encoding::percent_encode;

pub use courier_test::component::constants::DOWNLOAD_ROUTE_PREFIX;
pub use courier_test::component::proxy::TransferOutcome;
pub use courier_test::component::request::params::{DownloadParams, signed_query};

/// Collects every [`TransferResult`] the gateway reports.
#[derive(Default)]
pub struct RecordingObserver {
    results: Mutex<Vec<TransferResult>>,
}

impl TransferObserver for RecordingObserver {
    fn on_transfer(&self, result: &TransferResult) {
        self.results
            .lock()
            .expect("observer lock")
            .push(result.clone());
    }
}

impl RecordingObserver {
    #[must_use]
    pub fn results(&self) -> Vec<TransferResult> {
        self.results.lock().expect("observer lock").clone()
    }
}

/// A gateway service over its own temporary download root.
pub struct TestGateway {
    pub service: Service,
    pub observer: Arc<RecordingObserver>,
    pub root: TempDir,
}

impl TestGateway {
    /// Creates a gateway with the given server secret (empty for open mode).
    ///
    /// ## Panics
    /// Panics if the temporary directory or the gateway cannot be created.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let root = tempfile::tempdir().expect("Failed to create download root");
        let observer = Arc::new(RecordingObserver::default());
        let config = GatewayConfig {
            secret: secret.to_string().into(),
            download_root: root.path().to_path_buf(),
            request_allow: HeaderAllowList::default_request(),
            response_allow: HeaderAllowList::default_response(),
        };
        let gateway =
            DownloadGateway::new(config, observer.clone()).expect("Failed to build gateway");

        Self {
            service: Service::new(router(Arc::new(gateway))),
            observer,
            root,
        }
    }

    /// Writes a file under the download root, creating parent directories.
    ///
    /// ## Panics
    /// Panics if the file cannot be written.
    pub fn write_file(&self, relative: &str, contents: &[u8]) {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, contents).expect("Failed to write file");
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    #[must_use]
    pub fn transfers(&self) -> Vec<TransferResult> {
        self.observer.results()
    }
}

/// Builds `/download?<query>` from raw key/value pairs.
#[must_use]
pub fn download_path(pairs: &[(&str, &str)]) -> String {
    let query = pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{DOWNLOAD_ROUTE_PREFIX}?{query}")
}

/// Builds a signed `/download` path for `params`.
#[must_use]
pub fn signed_download_path(params: &DownloadParams, secret: &str) -> String {
    format!("{DOWNLOAD_ROUTE_PREFIX}?{}", signed_query(params, secret))
}

/// Starts a loopback salvo server for `router` and returns its base URL.
///
/// ## Panics
/// Panics if the listener has no TCP address.
pub async fn spawn_upstream(router: Router) -> String {
    let acceptor = TcpListener::new("127.0.0.1:0").bind().await;
    let addr = acceptor.holdings()[0]
        .local_addr
        .clone()
        .into_std()
        .expect("Upstream should listen on TCP");
    tokio::spawn(Server::new(acceptor).serve(router));
    format!("http://{addr}")
}

/// Represents an HTTP test request builder.
pub struct TestRequest {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl TestRequest {
    /// Creates a new test request with the given method and path.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a new GET request.
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a new POST request.
    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Adds a header to the request.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON request body.
    #[must_use]
    pub fn json_body(self, json: &serde_json::Value) -> Self {
        self.header("Content-Type", "application/json")
            .body(json.to_string().into_bytes())
    }

    /// Sends the request to the test service and returns the response.
    ///
    /// ## Panics
    /// Panics if the request cannot be sent or the response cannot be read.
    pub async fn send(self, service: &Service) -> TestResponse {
        let url = format!("http://127.0.0.1:5800{}", self.path);

        let mut client = match self.method.as_str() {
            "GET" => TestClient::get(&url),
            "POST" => TestClient::post(&url),
            "PUT" => TestClient::put(&url),
            "DELETE" => TestClient::delete(&url),
            _ => RequestBuilder::new(&url, self.method.clone()),
        };

        for (name, value) in self.headers {
            if let Ok(header_name) = HeaderName::try_from(name.as_str()) {
                client = client.add_header(header_name, value, true);
            }
        }

        if let Some(body_bytes) = self.body {
            client = client.body(ReqBody::Once(body_bytes.into()));
        }

        let mut response = client.send(service).await;

        let status = response
            .status_code
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body: Vec<u8> = response.take_bytes(None).await.unwrap_or_default().to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Represents an HTTP test response for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Asserts that the response status matches the expected code.
    #[must_use]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {expected} but got {} with body:\n{}",
            self.status,
            self.body_string()
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    #[must_use]
    pub fn assert_header(self, name: &str, expected: &str) -> Self {
        let value = self
            .get_header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found in response"));
        assert_eq!(
            value, expected,
            "Header '{name}' expected '{expected}' but got '{value}'"
        );
        self
    }

    /// Asserts that a header contains the expected substring.
    #[must_use]
    pub fn assert_header_contains(self, name: &str, expected: &str) -> Self {
        let value = self
            .get_header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found in response"));
        assert!(
            value.contains(expected),
            "Header '{name}' expected to contain '{expected}' but got '{value}'"
        );
        self
    }

    /// Asserts that a header is absent.
    #[must_use]
    pub fn assert_no_header(self, name: &str) -> Self {
        assert!(
            self.get_header(name).is_none(),
            "Header '{name}' should not be present"
        );
        self
    }

    /// Asserts that the response body contains the expected substring.
    #[must_use]
    pub fn assert_body_contains(self, expected: &str) -> Self {
        let body = self.body_string();
        assert!(
            body.contains(expected),
            "Expected body to contain '{expected}' but got:\n{body}"
        );
        self
    }

    /// Asserts that the response body equals the expected bytes.
    #[must_use]
    pub fn assert_body(self, expected: &[u8]) -> Self {
        assert_eq!(
            self.body,
            expected,
            "Unexpected body:\n{}",
            self.body_string()
        );
        self
    }

    /// Returns the body as a UTF-8 string.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON.
    ///
    /// ## Panics
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Response body should be JSON")
    }

    /// Returns the first value of a header, if present.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}
