//! Directory download: probe for a filename, then stream the file into a directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use reqwest::Method;
use reqwest::header::CONTENT_DISPOSITION;
use tracing::{debug, info, instrument};
use url::Url;

use super::blocking;
use super::constants::{PHASE_DOWNLOADING_FILE, PHASE_EXTRACTING_FILENAME};
use super::error::FetchError;
use super::filename::resolve_filename;
use super::report::{DownloadOutcome, FileDownloadStatus, Observers};
use super::request::FetchRequest;
use super::writer;

/// Terminal builder that saves the response body into a directory.
///
/// The output name is taken from the HEAD response: its Content-Disposition
/// filename, else the last URL that redirected, else the final URL's last
/// path segment.
#[derive(Debug)]
pub struct DirectoryDownload {
    request: FetchRequest,
    directory: PathBuf,
    skip_existing: bool,
    observers: Observers,
}

impl DirectoryDownload {
    pub(crate) fn new(request: FetchRequest, directory: PathBuf) -> Result<Self, FetchError> {
        if !directory.is_dir() {
            return Err(FetchError::configuration(format!(
                "output directory {} does not exist or is not a directory",
                directory.display()
            )));
        }
        Ok(Self {
            request,
            directory,
            skip_existing: false,
            observers: Observers::default(),
        })
    }

    /// Skips the GET when the resolved file is already present.
    #[must_use]
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
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

    /// The target directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Runs the download and returns the output path.
    ///
    /// Dropping the returned future cancels the transfer; neither the
    /// `Downloaded` status nor the downloaded observer fire in that case.
    ///
    /// # Errors
    ///
    /// See [`DirectoryDownload::download`].
    pub async fn assemble(self) -> Result<PathBuf, FetchError> {
        self.download().await.map(|outcome| outcome.path)
    }

    /// Blocking form of [`assemble`](Self::assemble) for single-shot commands.
    ///
    /// Must not be called from within an async runtime.
    ///
    /// # Errors
    ///
    /// See [`DirectoryDownload::download`], plus [`FetchError::Runtime`].
    pub fn execute(self) -> Result<PathBuf, FetchError> {
        blocking::block_on(self.assemble())?
    }

    /// Runs the download and returns its full outcome.
    ///
    /// # Errors
    ///
    /// - [`FetchError::FailedRequest`] for a non-2xx HEAD ("Extracting filename")
    ///   or GET ("Downloading file")
    /// - [`FetchError::ContentTypeMismatch`] when accepted types are set and the
    ///   response declares none of them
    /// - [`FetchError::Transport`] / [`FetchError::TooManyRedirects`] from the
    ///   network layer
    /// - [`FetchError::Io`] when writing the file fails
    #[instrument(skip(self), fields(uri = %self.request.uri()))]
    pub async fn download(self) -> Result<DownloadOutcome, FetchError> {
        let started = Instant::now();
        let scope = self.request.client_scope()?;
        let headers = self.request.request_headers()?;
        let uri = self.request.uri().clone();

        let probe = self.request.send(&scope, Method::HEAD, &headers).await?;
        self.request
            .ensure_success(&probe.response, PHASE_EXTRACTING_FILENAME)?;
        self.request.check_probe_content_type(&probe.response)?;

        let disposition = probe
            .response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok());
        let filename = resolve_filename(disposition, &probe.redirects, probe.response.url());
        let output_file = self.directory.join(&filename);
        debug!(
            %filename,
            redirects = probe.redirects.len(),
            path = %output_file.display(),
            "resolved output file"
        );
        drop(probe);

        if self.skip_existing
            && tokio::fs::try_exists(&output_file)
                .await
                .map_err(|e| FetchError::io(&output_file, e))?
        {
            info!(path = %output_file.display(), "file already exists, skipping download");
            self.observers.status(
                FileDownloadStatus::SkipFileExists,
                &uri,
                Some(&output_file),
            );
            return Ok(DownloadOutcome::skipped(output_file, started.elapsed()));
        }

        self.observers
            .status(FileDownloadStatus::Downloading, &uri, None);
        let transfer = self.request.send(&scope, Method::GET, &headers).await?;
        self.request
            .ensure_success(&transfer.response, PHASE_DOWNLOADING_FILE)?;
        self.request.check_content_type(&transfer.response)?;

        let bytes_written = writer::stream_to_file(transfer.response, &uri, &output_file).await?;

        self.observers.status(
            FileDownloadStatus::Downloaded,
            &uri,
            Some(&output_file),
        );
        self.observers.downloaded(&uri, &output_file, bytes_written);

        let elapsed = started.elapsed();
        info!(
            path = %output_file.display(),
            bytes = bytes_written,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "download complete"
        );
        Ok(DownloadOutcome::written(output_file, bytes_written, elapsed))
    }
}
