//! File download: stream the response body to a caller-chosen path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderValue, IF_MODIFIED_SINCE};
use reqwest::{Method, StatusCode};
use tracing::{debug, info, instrument};
use url::Url;

use super::blocking;
use super::constants::PHASE_DOWNLOADING_FILE;
use super::error::FetchError;
use super::report::{DownloadOutcome, FileDownloadStatus, Observers};
use super::request::FetchRequest;
use super::writer;

/// Terminal builder that saves the response body to a fixed file path.
#[derive(Debug)]
pub struct FileDownload {
    request: FetchRequest,
    file: PathBuf,
    skip_existing: bool,
    skip_up_to_date: bool,
    observers: Observers,
}

impl FileDownload {
    pub(crate) fn new(request: FetchRequest, file: PathBuf) -> Result<Self, FetchError> {
        let parent = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(FetchError::configuration(format!(
                "parent directory of {} does not exist or is not a directory",
                file.display()
            )));
        }
        Ok(Self {
            request,
            file,
            skip_existing: false,
            skip_up_to_date: false,
            observers: Observers::default(),
        })
    }

    /// Skips the request entirely when the file is already present.
    #[must_use]
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    /// Sends the existing file's modification time as `If-Modified-Since` and
    /// keeps the file when the server answers `304 Not Modified`.
    #[must_use]
    pub fn skip_up_to_date(mut self, skip: bool) -> Self {
        self.skip_up_to_date = skip;
        self
    }

    /// Observes lifecycle statuses.
    #[must_use]
    pub fn handle_status<F>(mut self, handler: F) -> Self
    where
        F: Fn(FileDownloadStatus, &Url, Option<&Path>) + Send + Sync + 'static,
    {
        self.observers.status = Some(Arc::new(handler));
        self
    }

    /// Observes each completed, non-skipped download with its byte count.
    #[must_use]
    pub fn handle_downloaded<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Url, &Path, u64) + Send + Sync + 'static,
    {
        self.observers.downloaded = Some(Arc::new(handler));
        self
    }

    /// Runs the download and returns the output path.
    ///
    /// # Errors
    ///
    /// See [`FileDownload::download`].
    pub async fn assemble(self) -> Result<PathBuf, FetchError> {
        self.download().await.map(|outcome| outcome.path)
    }

    /// Blocking form of [`assemble`](Self::assemble).
    ///
    /// # Errors
    ///
    /// See [`FileDownload::download`], plus [`FetchError::Runtime`].
    pub fn execute(self) -> Result<PathBuf, FetchError> {
        blocking::block_on(self.assemble())?
    }

    /// Runs the download and returns its full outcome.
    ///
    /// `Downloading` is reported once the server answered with a body, so a
    /// `304` skip never reports it.
    ///
    /// # Errors
    ///
    /// - [`FetchError::FailedRequest`] for a non-2xx GET ("Downloading file")
    /// - [`FetchError::ContentTypeMismatch`] for an unaccepted content type
    /// - [`FetchError::Transport`] / [`FetchError::TooManyRedirects`]
    /// - [`FetchError::Io`] when writing the file fails
    #[instrument(skip(self), fields(uri = %self.request.uri(), path = %self.file.display()))]
    pub async fn download(self) -> Result<DownloadOutcome, FetchError> {
        let started = Instant::now();
        let uri = self.request.uri().clone();
        let exists = tokio::fs::try_exists(&self.file)
            .await
            .map_err(|e| FetchError::io(&self.file, e))?;

        if self.skip_existing && exists {
            info!("file already exists, skipping download");
            self.observers
                .status(FileDownloadStatus::SkipFileExists, &uri, Some(&self.file));
            return Ok(DownloadOutcome::skipped(self.file, started.elapsed()));
        }

        let scope = self.request.client_scope()?;
        let mut headers = self.request.request_headers()?;
        if self.skip_up_to_date
            && exists
            && let Some(since) = modified_header(&self.file).await
        {
            debug!(if_modified_since = ?since, "requesting conditional download");
            headers.insert(IF_MODIFIED_SINCE, since);
        }

        let transfer = self.request.send(&scope, Method::GET, &headers).await?;
        if self.skip_up_to_date && exists && transfer.response.status() == StatusCode::NOT_MODIFIED
        {
            info!("file is up to date, skipping download");
            self.observers
                .status(FileDownloadStatus::SkipFileUpToDate, &uri, Some(&self.file));
            return Ok(DownloadOutcome::skipped(self.file, started.elapsed()));
        }
        self.request
            .ensure_success(&transfer.response, PHASE_DOWNLOADING_FILE)?;
        self.request.check_content_type(&transfer.response)?;

        self.observers
            .status(FileDownloadStatus::Downloading, &uri, None);
        let bytes_written = writer::stream_to_file(transfer.response, &uri, &self.file).await?;

        self.observers
            .status(FileDownloadStatus::Downloaded, &uri, Some(&self.file));
        self.observers.downloaded(&uri, &self.file, bytes_written);

        let elapsed = started.elapsed();
        info!(bytes = bytes_written, "download complete");
        Ok(DownloadOutcome::written(self.file.clone(), bytes_written, elapsed))
    }
}

async fn modified_header(file: &Path) -> Option<HeaderValue> {
    let modified = tokio::fs::metadata(file).await.ok()?.modified().ok()?;
    HeaderValue::from_str(&httpdate::fmt_http_date(modified)).ok()
}
