//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mc_fetch::FileDownloadStatus;
use url::Url;
use wiremock::MockServer;

/// Recorded status notifications: `(status, file)`.
pub type StatusLog = Arc<Mutex<Vec<(FileDownloadStatus, Option<PathBuf>)>>>;

/// Recorded downloaded notifications: `(file, bytes)`.
pub type DownloadedLog = Arc<Mutex<Vec<(PathBuf, u64)>>>;

/// Builds a status observer that appends to `log`.
pub fn record_status(
    log: &StatusLog,
) -> impl Fn(FileDownloadStatus, &Url, Option<&Path>) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |status, _uri, file| {
        log.lock()
            .unwrap()
            .push((status, file.map(Path::to_path_buf)));
    }
}

/// Builds a downloaded observer that appends to `log`.
pub fn record_downloaded(log: &DownloadedLog) -> impl Fn(&Url, &Path, u64) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_uri, file, bytes| {
        log.lock().unwrap().push((file.to_path_buf(), bytes));
    }
}

/// Number of requests with `method` the server has received.
pub async fn count_requests(server: &MockServer, method: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == method)
        .count()
}

/// Parses `"{server}{path}"`.
pub fn url_on(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{path}", server.uri())).unwrap()
}
