//! Filename extraction and sanitization for directory downloads.
//!
//! Output names come from, in priority order, the Content-Disposition header,
//! the last URL that answered with a redirect, and the final response URL.
//! Resolution never fails: every unusable candidate falls through to the next.

use std::path::{Component, Path};

use url::Url;

/// Name used when no candidate yields a usable filename.
pub(crate) const FALLBACK_FILENAME: &str = "download";

/// Resolves the output filename for a download.
///
/// `redirects` is the ordered list of URLs that answered with a redirect
/// before `response_url` produced the final response.
#[must_use]
pub fn resolve_filename(
    content_disposition: Option<&str>,
    redirects: &[Url],
    response_url: &Url,
) -> String {
    if let Some(name) = content_disposition
        .and_then(parse_content_disposition)
        .and_then(|name| usable(&name))
    {
        return name;
    }

    if let Some(name) = redirects
        .last()
        .and_then(last_path_segment)
        .and_then(|name| usable(&name))
    {
        return name;
    }

    last_path_segment(response_url)
        .and_then(|name| usable(&name))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Parses a Content-Disposition header value to extract the filename.
///
/// Handles:
/// - `attachment; filename="example.jar"`
/// - `attachment; filename=example.jar`
/// - `attachment; filename*=UTF-8''example%20file.jar` (RFC 5987, preferred)
///
/// An extended name that cannot be used as a filename (such as `..`) gives
/// way to the plain `filename=` parameter.
#[must_use]
pub fn parse_content_disposition(header: &str) -> Option<String> {
    match extended_filename(header) {
        Some(name) if usable(&name).is_some() => Some(name),
        extended => plain_filename(header).or(extended),
    }
}

/// The RFC 5987 `filename*=` parameter, percent-decoded.
fn extended_filename(header: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `header`.
    let pos = header.to_ascii_lowercase().find("filename*=")?;
    let value = header[pos + 10..].trim();
    // Format: charset'language'encoded_value
    let quote_pos = value.find("''")?;
    let encoded = &value[quote_pos + 2..];
    let end = encoded.find(';').unwrap_or(encoded.len());
    let encoded_name = encoded[..end].trim().trim_matches('"');
    let decoded = urlencoding::decode(encoded_name).ok()?;
    (!decoded.is_empty()).then(|| decoded.into_owned())
}

/// The plain `filename=` parameter, quoted or bare.
fn plain_filename(header: &str) -> Option<String> {
    let pos = header.to_ascii_lowercase().find("filename=")?;
    let value = header[pos + 9..].trim();

    if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"')?;
        let filename = &stripped[..end];
        return (!filename.is_empty()).then(|| filename.to_string());
    }

    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| filename.to_string())
}

/// Returns the percent-decoded last non-empty path segment of `url`.
#[must_use]
pub fn last_path_segment(url: &Url) -> Option<String> {
    let last = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    Some(decoded)
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |` and control characters) and rewrites dot-only names.
#[must_use]
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

/// Keeps only the basename of a suggested name and sanitizes it.
fn usable(candidate: &str) -> Option<String> {
    let basename = candidate
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(candidate)
        .trim();
    if basename.is_empty() {
        return None;
    }
    let sanitized = sanitize_filename(basename);
    (!sanitized.trim_matches('_').is_empty()).then_some(sanitized)
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
