//! Local file delivery.
//!
//! Range and validator handling (`Range`, `If-Modified-Since`, `ETag`) is left
//! to salvo's `NamedFile`; this module only fixes up the download headers.

use std::path::Path;

use salvo::fs::NamedFile;
use salvo::http::HeaderMap;
use salvo::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderValue};
use salvo::Response;

use super::headers::content_disposition;
use super::remote::ProxyError;

pub(crate) const OCTET_STREAM: &str = "application/octet-stream";

/// ## Summary
/// Prepares the response for the file at `path` as an attachment named
/// `filename`. The body is set but not yet read.
///
/// ## Errors
/// Returns `ProxyError::Open` if the file cannot be opened, e.g. because it was
/// removed after it was resolved.
pub async fn serve_file(
    path: &Path,
    filename: &str,
    request_headers: &HeaderMap,
    res: &mut Response,
) -> Result<(), ProxyError> {
    let file = NamedFile::builder(path)
        .build()
        .await
        .map_err(|err| ProxyError::Open(err.to_string()))?;
    file.send(request_headers, res).await;

    let headers = res.headers_mut();
    headers.insert(CONTENT_DISPOSITION, content_disposition(filename));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    Ok(())
}
