//! Blocking entry points for single-operation callers.

use std::future::Future;

use super::error::FetchError;

/// Drives `future` to completion on a fresh current-thread runtime.
///
/// Panics (inside tokio) if called from within an async runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, FetchError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| FetchError::Runtime { source })?;
    Ok(runtime.block_on(future))
}
