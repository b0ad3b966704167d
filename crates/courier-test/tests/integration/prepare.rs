#![allow(clippy::unused_async)]
//! Tests for the prepare (POST) flow and the `?enc=` fetch it enables.

use salvo::http::StatusCode;
use salvo::prelude::*;
use serde_json::json;

use super::helpers::*;

#[handler]
async fn report(res: &mut Response) {
    res.render(Text::Plain("quarterly numbers"));
}

async fn upstream() -> String {
    spawn_upstream(Router::with_path("files/report.csv").get(report)).await
}

async fn prepare_token(gateway: &TestGateway, body: &serde_json::Value) -> String {
    let response = TestRequest::post(DOWNLOAD_ROUTE_PREFIX)
        .json_body(body)
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::OK);
    let json = response.json();
    assert_eq!(json["code"], 200);
    assert_eq!(json["msg"], "success");
    json["data"]
        .as_str()
        .expect("Prepare response should carry a token")
        .to_string()
}

/// ## Summary
/// A token prepared with the server's secret unlocks the download; the same
/// token is rejected by a gateway holding any other secret.
#[test_log::test(tokio::test)]
async fn prepared_token_round_trip() {
    let base = upstream().await;
    let gateway = TestGateway::new("secret2");

    let token = prepare_token(
        &gateway,
        &json!({ "url": format!("{base}/files/report.csv"), "sign": "secret2" }),
    )
    .await;
    assert!(!token.contains('='), "token should be unpadded: {token}");

    let _response = TestRequest::get(&download_path(&[("enc", &token)]))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::OK)
        .assert_header("Content-Disposition", "attachment; filename=\"report.csv\"")
        .assert_body(b"quarterly numbers");

    let transfers = gateway.transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].filename, "report.csv");
    assert_eq!(transfers[0].outcome, TransferOutcome::Completed);

    let other = TestGateway::new("different");
    let _response = TestRequest::get(&download_path(&[("enc", &token)]))
        .send(&other.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("Invalid enc");
    assert!(other.transfers().is_empty());
}

/// ## Summary
/// The envelope wins over any plain parameters sent alongside it.
#[test_log::test(tokio::test)]
async fn envelope_takes_precedence_over_query() {
    let base = upstream().await;
    let gateway = TestGateway::new("k1");

    let token = prepare_token(
        &gateway,
        &json!({
            "url": format!("{base}/files/report.csv"),
            "filename": "q3.csv",
            "sign": "k1"
        }),
    )
    .await;

    let _response = TestRequest::get(&download_path(&[
        ("enc", &token),
        ("url", "file:///etc/passwd"),
        ("filename", "other.txt"),
        ("sign", "bogus"),
    ]))
    .send(&gateway.service)
    .await
    .assert_status(StatusCode::OK)
    .assert_header("Content-Disposition", "attachment; filename=\"q3.csv\"")
    .assert_body(b"quarterly numbers");
}

/// ## Summary
/// A numeric `expire` is accepted and enforced after decryption.
#[test_log::test(tokio::test)]
async fn numeric_expire_is_enforced() {
    let base = upstream().await;
    let gateway = TestGateway::new("k1");
    let url = format!("{base}/files/report.csv");

    let future = chrono::Utc::now().timestamp() + 3600;
    let token = prepare_token(&gateway, &json!({ "url": url, "expire": future, "sign": "k1" })).await;
    let _response = TestRequest::get(&download_path(&[("enc", &token)]))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::OK);

    let token = prepare_token(&gateway, &json!({ "url": url, "expire": 1, "sign": "k1" })).await;
    let _response = TestRequest::get(&download_path(&[("enc", &token)]))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_body_contains("expired");
}

/// ## Summary
/// Malformed bodies and missing urls answer with a JSON 400.
#[test_log::test(tokio::test)]
async fn prepare_rejects_bad_input() {
    let gateway = TestGateway::new("k1");

    let response = TestRequest::post(DOWNLOAD_ROUTE_PREFIX)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let json = response.json();
    assert_eq!(json["code"], 400);
    assert_eq!(json["msg"], "Invalid request body");
    assert!(json["data"].is_null());

    let response = TestRequest::post(DOWNLOAD_ROUTE_PREFIX)
        .json_body(&json!({ "filename": "a.bin", "sign": "k1" }))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let json = response.json();
    assert_eq!(json["code"], 400);
    assert_eq!(json["msg"], "Missing required parameter: url");
}

/// ## Summary
/// A garbled token is an authentication failure, not a server error.
#[test_log::test(tokio::test)]
async fn garbled_token_is_rejected() {
    let gateway = TestGateway::new("k1");

    for token in ["not-base64!!", "AAAA", "eyJzYWx0IjoiIn0"] {
        let _response = TestRequest::get(&download_path(&[("enc", token)]))
            .send(&gateway.service)
            .await
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_body_contains("Invalid enc");
    }
}
