#![allow(clippy::unused_async)]
//! Tests for `file://` downloads under the download root.
//!
//! Verifies path confinement, file type checks, expiry and transfer reporting.

use salvo::http::StatusCode;

use super::helpers::*;

fn local(url: &str) -> DownloadParams {
    DownloadParams {
        url: url.to_string(),
        ..DownloadParams::default()
    }
}

/// ## Summary
/// A signed local link streams the file as an octet-stream attachment.
#[test_log::test(tokio::test)]
async fn signed_local_file_is_served() {
    let gateway = TestGateway::new("k1");
    gateway.write_file("reports/q1.pdf", b"%PDF-1.7 quarterly");

    let path = signed_download_path(&local("file:///reports/q1.pdf"), "k1");
    let _response = TestRequest::get(&path)
        .header("User-Agent", "curl/8.5")
        .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::OK)
        .assert_header("Content-Type", "application/octet-stream")
        .assert_header("Content-Disposition", "attachment; filename=\"q1.pdf\"")
        .assert_header("Content-Length", "18")
        .assert_body(b"%PDF-1.7 quarterly");

    let transfers = gateway.transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].bytes_written, 18);
    assert_eq!(transfers[0].source, "file:///reports/q1.pdf");
    assert_eq!(transfers[0].caller.address, "203.0.113.7");
    assert_eq!(transfers[0].caller.agent, "curl/8.5");
    assert_eq!(transfers[0].outcome, TransferOutcome::Completed);
}

/// ## Summary
/// Percent-encoded names are decoded before they are resolved.
#[test_log::test(tokio::test)]
async fn percent_encoded_local_name_is_decoded() {
    let gateway = TestGateway::new("");
    gateway.write_file("my file.txt", b"spaced");

    let _response = TestRequest::get(&download_path(&[
        ("url", "file:///my%20file.txt"),
        ("filename", "renamed.txt"),
    ]))
    .send(&gateway.service)
    .await
    .assert_status(StatusCode::OK)
    .assert_header("Content-Disposition", "attachment; filename=\"renamed.txt\"")
    .assert_body(b"spaced");
}

/// ## Summary
/// References that climb above the root are rejected and nothing is read.
#[test_log::test(tokio::test)]
async fn traversal_is_rejected() {
    let gateway = TestGateway::new("");
    gateway.write_file("inside.txt", b"inside");

    for reference in [
        "file:///../etc/passwd",
        "file:///%2e%2e/%2e%2e/etc/passwd",
        "file:///reports/../../etc/passwd",
        "file://localhost/..%2F..%2Fetc%2Fpasswd",
    ] {
        let response = TestRequest::get(&download_path(&[("url", reference)]))
            .send(&gateway.service)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        assert!(
            !response.body_string().contains("root"),
            "{reference} leaked detail"
        );
    }
    assert!(gateway.transfers().is_empty());
}

/// ## Summary
/// Missing files are 404 and directories are 400.
#[test_log::test(tokio::test)]
async fn missing_files_and_directories() {
    let gateway = TestGateway::new("");
    gateway.write_file("dir/nested.txt", b"x");

    let response = TestRequest::get(&download_path(&[("url", "file:///missing.bin")]))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_body_contains("File not found");
    let root = gateway.root().display().to_string();
    assert!(!response.body_string().contains(&root));

    let _response = TestRequest::get(&download_path(&[("url", "file:///dir")]))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("not a file");
}

/// ## Summary
/// An expired link is 403; a malformed expiry is 400.
#[test_log::test(tokio::test)]
async fn expiry_is_enforced() {
    let gateway = TestGateway::new("k1");
    gateway.write_file("a.txt", b"a");

    let expired = DownloadParams {
        url: "file:///a.txt".to_string(),
        expire: Some("1700000000".to_string()),
        ..DownloadParams::default()
    };
    let _response = TestRequest::get(&signed_download_path(&expired, "k1"))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_body_contains("expired");

    let valid_until = (chrono::Utc::now().timestamp() + 3600).to_string();
    let fresh = DownloadParams {
        expire: Some(valid_until),
        ..expired.clone()
    };
    let _response = TestRequest::get(&signed_download_path(&fresh, "k1"))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::OK);

    let malformed = DownloadParams {
        expire: Some("tomorrow".to_string()),
        ..expired
    };
    let _response = TestRequest::get(&signed_download_path(&malformed, "k1"))
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

/// ## Summary
/// Range requests against local files are answered with partial content.
#[test_log::test(tokio::test)]
async fn local_range_request() {
    let gateway = TestGateway::new("");
    gateway.write_file("digits.txt", b"0123456789");

    let _response = TestRequest::get(&download_path(&[("url", "file:///digits.txt")]))
        .header("Range", "bytes=2-5")
        .send(&gateway.service)
        .await
        .assert_status(StatusCode::PARTIAL_CONTENT)
        .assert_body(b"2345");

    let transfers = gateway.transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].bytes_written, 4);
}
