//! Error types for the fetch module.
//!
//! Every terminal operation returns a [`FetchError`] describing which stage
//! failed, with enough context (URI, status, phase, path) for calling layers to
//! translate it into an exit code and an operator-facing message.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching or downloading.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Invalid local setup detected before any network activity.
    #[error("configuration error: {message}")]
    Configuration {
        /// What was wrong.
        message: String,
    },

    /// The server answered with a status outside the 2xx class.
    #[error("{phase} failed: HTTP {status} from {uri}")]
    FailedRequest {
        /// The HTTP status code.
        status: u16,
        /// The URI that was requested.
        uri: String,
        /// The pipeline stage that issued the request.
        phase: &'static str,
    },

    /// The response content type is not one of the accepted types.
    #[error("unexpected content type from {uri}: expected one of {expected:?}, got {actual:?}")]
    ContentTypeMismatch {
        /// The URI that was requested.
        uri: String,
        /// Accepted MIME types, in the order they were configured.
        expected: Vec<String>,
        /// MIME bases observed on the response.
        actual: Vec<String>,
    },

    /// File system error while writing the download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Connection, DNS, TLS, timeout or body-read failure from the HTTP layer.
    #[error("transport error fetching {uri}: {source}")]
    Transport {
        /// The URI being fetched.
        uri: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The provided URI is malformed or not http(s).
    #[error("invalid URI: {uri}")]
    InvalidUri {
        /// The invalid URI string.
        uri: String,
    },

    /// A configured header name or value cannot be sent.
    #[error("invalid header {name:?}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// The redirect limit was exceeded.
    #[error("too many redirects fetching {uri} (limit {limit})")]
    TooManyRedirects {
        /// The URI originally requested.
        uri: String,
        /// The configured redirect limit.
        limit: usize,
    },

    /// The blocking executor for `execute()` could not be started.
    #[error("failed to start fetch runtime: {source}")]
    Runtime {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a failed-request error for the given pipeline phase.
    pub fn failed_request(status: u16, uri: impl Into<String>, phase: &'static str) -> Self {
        Self::FailedRequest {
            status,
            uri: uri.into(),
            phase,
        }
    }

    /// Creates a content-type mismatch error.
    pub fn content_type_mismatch(
        uri: impl Into<String>,
        expected: Vec<String>,
        actual: Vec<String>,
    ) -> Self {
        Self::ContentTypeMismatch {
            uri: uri.into(),
            expected,
            actual,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a transport error from a reqwest error.
    pub fn transport(uri: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            uri: uri.into(),
            source,
        }
    }

    /// Creates an invalid URI error.
    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidUri { uri: uri.into() }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// Creates a redirect-limit error.
    pub fn too_many_redirects(uri: impl Into<String>, limit: usize) -> Self {
        Self::TooManyRedirects {
            uri: uri.into(),
            limit,
        }
    }

    /// HTTP status carried by a [`FetchError::FailedRequest`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::FailedRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Pipeline phase carried by a [`FetchError::FailedRequest`].
    #[must_use]
    pub fn phase(&self) -> Option<&'static str> {
        match self {
            Self::FailedRequest { phase, .. } => Some(phase),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URI or path the source error lacks, so callers go through the constructors.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_request_display_names_phase_status_and_uri() {
        let error =
            FetchError::failed_request(404, "https://example.com/loader.jar", "Extracting filename");
        let msg = error.to_string();
        assert!(msg.starts_with("Extracting filename failed"), "got: {msg}");
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/loader.jar"),
            "Expected URI in: {msg}"
        );
    }

    #[test]
    fn test_status_and_phase_accessors() {
        let error = FetchError::failed_request(503, "https://example.com/", "Downloading file");
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.phase(), Some("Downloading file"));

        let other = FetchError::invalid_uri("nope");
        assert_eq!(other.status(), None);
        assert_eq!(other.phase(), None);
    }

    #[test]
    fn test_content_type_mismatch_display_lists_both_sides() {
        let error = FetchError::content_type_mismatch(
            "https://example.com/meta",
            vec!["application/json".to_string()],
            vec!["text/html".to_string()],
        );
        let msg = error.to_string();
        assert!(msg.contains("application/json"), "got: {msg}");
        assert!(msg.contains("text/html"), "got: {msg}");
    }

    #[test]
    fn test_io_display_includes_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = FetchError::io(PathBuf::from("/data/mods/pack.zip"), io_error);
        assert!(error.to_string().contains("/data/mods/pack.zip"));
    }

    #[test]
    fn test_too_many_redirects_display() {
        let error = FetchError::too_many_redirects("https://example.com/loop", 10);
        let msg = error.to_string();
        assert!(msg.contains("limit 10"), "got: {msg}");
    }
}
