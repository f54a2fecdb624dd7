//! mc-fetch Library
//!
//! Composable HTTP fetch builders for unattended game-server provisioning:
//! downloading mod loader installers, mod pack archives and metadata with
//! filename resolution, skip-existing re-runs and status reporting.
//!
//! # Architecture
//!
//! - [`fetch`] - request builder, shared client handle and terminal download builders

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod fetch;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use fetch::{
    DirectoryDownload, DownloadOutcome, FetchError, FetchOptions, FetchRequest, FileDownload,
    FileDownloadStatus, SharedFetch, fetch,
};
