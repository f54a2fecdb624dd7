//! Composable HTTP fetch builders for installer commands.
//!
//! A [`FetchRequest`] describes what to fetch and how (accepted content types,
//! headers, User-Agent command tag, optional [`SharedFetch`] handle). It is
//! then consumed by a terminal builder that commits to an output shape:
//!
//! - [`DirectoryDownload`] - probe with HEAD, name the file from the response,
//!   stream it into a directory
//! - [`FileDownload`] - stream to a fixed path, optionally skipping when the
//!   file exists or is up to date
//!
//! Terminal builders expose `assemble()` (async) and `execute()` (blocking).
//!
//! # Example
//!
//! ```no_run
//! use mc_fetch::fetch::{FetchOptions, SharedFetch};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let shared = SharedFetch::new("install-modpack", &FetchOptions::default())?;
//! let path = shared
//!     .fetch(Url::parse("https://cdn.example.com/packs/latest")?)
//!     .to_directory("/data/packs")?
//!     .skip_existing(true)
//!     .handle_downloaded(|uri, file, bytes| {
//!         println!("{uri} -> {} ({bytes} bytes)", file.display());
//!     })
//!     .assemble()
//!     .await?;
//! println!("pack at {}", path.display());
//! # Ok(())
//! # }
//! ```

mod blocking;
pub(crate) mod constants;
mod content_type;
mod directory;
mod error;
mod file;
pub mod filename;
mod redirect;
mod report;
mod request;
mod shared;
mod writer;

pub use constants::{FETCH_SESSION_HEADER, PHASE_DOWNLOADING_FILE, PHASE_EXTRACTING_FILENAME};
pub use content_type::mime_base;
pub use directory::DirectoryDownload;
pub use error::FetchError;
pub use file::FileDownload;
pub use report::{DownloadOutcome, DownloadedHandler, FileDownloadStatus, StatusHandler};
pub use request::FetchRequest;
pub use shared::{FetchOptions, SharedFetch};

use url::Url;

/// Starts a request for `uri` without a shared client handle.
#[must_use]
pub fn fetch(uri: Url) -> FetchRequest {
    FetchRequest::new(uri)
}

// Note: as elsewhere in the crate, no module-local Result alias.
// Use `Result<T, FetchError>` explicitly in function signatures.
