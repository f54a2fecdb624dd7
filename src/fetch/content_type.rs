//! Content-type negotiation helpers.

use reqwest::header::{CONTENT_TYPE, HeaderMap};

/// Extracts the lowercase MIME base of a Content-Type value, dropping parameters.
///
/// `"Application/JSON; charset=utf-8"` becomes `"application/json"`.
#[must_use]
pub fn mime_base(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// MIME bases of every Content-Type header on a response.
pub(crate) fn response_mime_bases(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(CONTENT_TYPE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(mime_base)
        .filter(|base| !base.is_empty())
        .collect()
}

/// Whether any of `actual` is one of the `accepted` types.
///
/// An empty accepted set is unconstrained.
pub(crate) fn matches_any(accepted: &[String], actual: &[String]) -> bool {
    accepted.is_empty()
        || actual
            .iter()
            .any(|base| accepted.iter().any(|want| mime_base(want) == *base))
}
