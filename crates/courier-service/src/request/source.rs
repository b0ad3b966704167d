//! Classifies a source reference as a remote URL or a local file reference.

use reqwest::Url;
use thiserror::Error;

use super::encoding::percent_decode;

const FALLBACK_FILENAME: &str = "download";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SourceError {
    #[error("Failed to parse url: {0}")]
    InvalidUrl(String),

    #[error("Unsupported url scheme: {0}")]
    UnsupportedScheme(String),
}

/// Where the bytes of a download come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `http` or `https` upstream.
    Remote(Url),
    /// Raw, still percent-encoded path of a `file://` reference.
    Local(String),
}

/// ## Summary
/// Parses `reference` and decides which transfer branch serves it.
///
/// The path of a `file://` reference is taken verbatim from the input rather
/// than from the parsed URL, because URL parsing would already collapse `..`
/// segments and hide traversal attempts from the path resolver.
///
/// ## Errors
/// Returns `SourceError::InvalidUrl` if the reference does not parse and
/// `SourceError::UnsupportedScheme` for schemes other than http, https and file.
pub fn classify(reference: &str) -> Result<Source, SourceError> {
    let url = Url::parse(reference).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(Source::Remote(url)),
        "file" => Ok(Source::Local(raw_file_path(reference).to_string())),
        other => Err(SourceError::UnsupportedScheme(other.to_string())),
    }
}

/// Extracts the path text of a `file:` reference, skipping any authority and
/// dropping query and fragment.
fn raw_file_path(reference: &str) -> &str {
    let rest = reference
        .split_once(':')
        .map_or(reference, |(_, after_scheme)| after_scheme);
    let path = match rest.strip_prefix("//") {
        Some(after_slashes) => after_slashes
            .find('/')
            .map_or("", |index| &after_slashes[index..]),
        None => rest,
    };
    path.split(['?', '#']).next().unwrap_or_default()
}

/// ## Summary
/// Derives a download filename from the last non-empty path segment of
/// `reference`, falling back to the URL host.
#[must_use]
pub fn derive_filename(reference: &str) -> String {
    let Ok(url) = Url::parse(reference) else {
        return FALLBACK_FILENAME.to_string();
    };

    let path = if url.scheme() == "file" {
        raw_file_path(reference)
    } else {
        url.path()
    };

    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .map(percent_decode)
        .filter(|name| name != "." && name != "..")
        .or_else(|| url.host_str().map(str::to_string))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}
