#![allow(clippy::unused_async)]
//! Tests for method dispatch on the download route and the health check.

use salvo::http::{Method, StatusCode};

use super::helpers::*;

/// ## Summary
/// Methods other than GET and POST on the download route are rejected with 405.
#[test_log::test(tokio::test)]
async fn other_methods_are_not_allowed() {
    let gateway = TestGateway::new("k1");

    for method in [Method::PUT, Method::DELETE, Method::PATCH] {
        let response = TestRequest::new(method.clone(), DOWNLOAD_ROUTE_PREFIX)
            .send(&gateway.service)
            .await;
        assert_eq!(
            response.status,
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} should be rejected"
        );
    }
    assert!(gateway.transfers().is_empty());
}

/// ## Summary
/// The health check answers with a plain `OK`.
#[test_log::test(tokio::test)]
async fn healthcheck_answers_ok() {
    let gateway = TestGateway::new("");

    let _response = TestRequest::get("/healthcheck")
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::OK)
        .assert_body(b"OK");
}

/// ## Summary
/// A GET without any parameters is a 400, never a transfer.
#[test_log::test(tokio::test)]
async fn missing_url_is_bad_request() {
    let gateway = TestGateway::new("k1");

    let _response = TestRequest::get(DOWNLOAD_ROUTE_PREFIX)
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Missing required parameter: url");
    assert!(gateway.transfers().is_empty());
}

/// ## Summary
/// Schemes other than http, https and file are rejected.
#[test_log::test(tokio::test)]
async fn unsupported_scheme_is_bad_request() {
    let gateway = TestGateway::new("");

    let _response = TestRequest::get(&download_path(&[("url", "ftp://host/a.bin")]))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Invalid url");
}
