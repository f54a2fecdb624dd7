//! Download status reporting: observer callbacks and the final outcome.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use url::Url;

/// Lifecycle status delivered to the status observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileDownloadStatus {
    /// The GET request carrying the file was submitted.
    Downloading,
    /// The file was written completely.
    Downloaded,
    /// The output file already existed and skip-existing was enabled.
    SkipFileExists,
    /// The server reported the existing file as not modified.
    SkipFileUpToDate,
}

/// Status observer: `(status, uri, file)`. The file is absent for `Downloading`.
pub type StatusHandler = Arc<dyn Fn(FileDownloadStatus, &Url, Option<&Path>) + Send + Sync>;

/// Downloaded observer: `(uri, file, bytes_written)`.
pub type DownloadedHandler = Arc<dyn Fn(&Url, &Path, u64) + Send + Sync>;

/// The result of a successful terminal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Where the file lives.
    pub path: PathBuf,
    /// Bytes written by this operation (zero when skipped).
    pub bytes_written: u64,
    /// Wall time of the whole operation.
    pub elapsed: Duration,
    /// Whether the transfer was skipped.
    pub skipped: bool,
}

impl DownloadOutcome {
    pub(crate) fn skipped(path: PathBuf, elapsed: Duration) -> Self {
        Self {
            path,
            bytes_written: 0,
            elapsed,
            skipped: true,
        }
    }

    pub(crate) fn written(path: PathBuf, bytes_written: u64, elapsed: Duration) -> Self {
        Self {
            path,
            bytes_written,
            elapsed,
            skipped: false,
        }
    }
}

/// Optional observers attached to a terminal builder.
///
/// A panicking observer is caught and logged; it never changes the outcome of
/// the operation that invoked it.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    pub(crate) status: Option<StatusHandler>,
    pub(crate) downloaded: Option<DownloadedHandler>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("status", &self.status.is_some())
            .field("downloaded", &self.downloaded.is_some())
            .finish()
    }
}

impl Observers {
    pub(crate) fn status(&self, status: FileDownloadStatus, uri: &Url, file: Option<&Path>) {
        if let Some(handler) = &self.status
            && catch_unwind(AssertUnwindSafe(|| handler(status, uri, file))).is_err()
        {
            warn!(?status, %uri, "status observer panicked; ignoring");
        }
    }

    pub(crate) fn downloaded(&self, uri: &Url, file: &Path, bytes_written: u64) {
        if let Some(handler) = &self.downloaded
            && catch_unwind(AssertUnwindSafe(|| handler(uri, file, bytes_written))).is_err()
        {
            warn!(%uri, path = %file.display(), "downloaded observer panicked; ignoring");
        }
    }
}
