//! Header allow-lists for both directions of the proxy, plus the
//! `Content-Disposition` value the gateway attaches to every download.

use std::collections::HashSet;

use salvo::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderName};

use crate::request::encoding::percent_encode;

/// Caller headers forwarded to the upstream.
const DEFAULT_REQUEST_ALLOW: &[HeaderName] = &[
    header::RANGE,
    header::IF_RANGE,
    header::IF_MATCH,
    header::IF_NONE_MATCH,
    header::IF_MODIFIED_SINCE,
    header::IF_UNMODIFIED_SINCE,
    header::AUTHORIZATION,
    header::COOKIE,
    header::USER_AGENT,
    header::ACCEPT,
    header::ACCEPT_ENCODING,
    header::ACCEPT_LANGUAGE,
];

/// Upstream headers forwarded to the caller.
const DEFAULT_RESPONSE_ALLOW: &[HeaderName] = &[
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::CONTENT_ENCODING,
    header::CONTENT_LANGUAGE,
    header::ACCEPT_RANGES,
    header::ETAG,
    header::LAST_MODIFIED,
    header::CACHE_CONTROL,
    header::EXPIRES,
    header::SET_COOKIE,
];

/// Immutable set of header names allowed across one trust boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderAllowList {
    names: HashSet<HeaderName>,
}

impl HeaderAllowList {
    #[must_use]
    pub fn new(names: impl IntoIterator<Item = HeaderName>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// ## Summary
    /// Builds an allow-list from configured header names (case-insensitive).
    ///
    /// ## Errors
    /// Returns an error for the first name that is not a valid header name.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, InvalidHeaderName> {
        names
            .iter()
            .map(|name| HeaderName::from_bytes(name.as_ref().trim().as_bytes()))
            .collect::<Result<HashSet<_>, _>>()
            .map(|names| Self { names })
    }

    #[must_use]
    pub fn default_request() -> Self {
        Self::new(DEFAULT_REQUEST_ALLOW.iter().cloned())
    }

    #[must_use]
    pub fn default_response() -> Self {
        Self::new(DEFAULT_RESPONSE_ALLOW.iter().cloned())
    }

    #[must_use]
    pub fn allows(&self, name: &HeaderName) -> bool {
        self.names.contains(name)
    }

    /// ## Summary
    /// Copies every allowed header of `source`, keeping repeated values.
    #[must_use]
    pub fn filter(&self, source: &HeaderMap) -> HeaderMap {
        let mut filtered = HeaderMap::new();
        for (name, value) in source {
            if self.allows(name) {
                filtered.append(name.clone(), value.clone());
            }
        }
        filtered
    }
}

/// ## Summary
/// Builds `attachment; filename="<name>"` for a download.
///
/// Quotes, backslashes, control characters and non-ASCII characters are
/// replaced in the quoted form. Whenever that loses information an RFC 6266
/// `filename*` parameter carries the exact UTF-8 name as well.
#[must_use]
pub fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = if fallback == filename {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            percent_encode(filename)
        )
    };

    // Every byte above is visible ASCII, so this cannot fail in practice.
    HeaderValue::from_str(&value).unwrap_or_else(|_err| HeaderValue::from_static("attachment"))
}
