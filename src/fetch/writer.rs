//! Streams a response body to disk on the blocking thread pool.
//!
//! The network stage reads body chunks and hands them over a bounded channel to
//! a `spawn_blocking` writer, so disk I/O never stalls the async runtime.
//!
//! Bodies are written to a hidden `.<name>.<id>.part` sibling, unique to each
//! transfer, and renamed over the target only after the last chunk was written
//! and flushed. If the transfer
//! fails, or the download future is dropped, the part file is removed and any
//! existing target is left as it was.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::Response;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

use super::constants::WRITE_CHANNEL_CAPACITY;
use super::error::FetchError;

enum WriteMsg {
    Chunk(Bytes),
    Finish,
}

/// A fresh in-progress path for `target`. Concurrent transfers to the same
/// target never share one.
#[must_use]
pub(crate) fn part_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| "download".into(), |n| n.to_string_lossy().into_owned());
    let id = Uuid::new_v4().simple();
    target.with_file_name(format!(".{name}.{id}.part"))
}

/// Streams `response`'s body into `target`, returning the number of bytes written.
pub(crate) async fn stream_to_file(
    response: Response,
    uri: &Url,
    target: &Path,
) -> Result<u64, FetchError> {
    let (tx, rx) = mpsc::channel(WRITE_CHANNEL_CAPACITY);
    let part = part_path(target);
    let writer_target = target.to_path_buf();
    let writer = tokio::task::spawn_blocking(move || write_blocking(rx, &part, &writer_target));

    let pumped = pump(response, tx, uri).await;
    let written = writer
        .await
        .map_err(|e| FetchError::io(target, io::Error::other(e)))?;

    // A network failure explains the writer's interruption, so report it first.
    pumped?;
    written
}

/// Forwards body chunks to the writer. Stops quietly if the writer has gone
/// away, since its own result carries the reason.
async fn pump(response: Response, tx: mpsc::Sender<WriteMsg>, uri: &Url) -> Result<(), FetchError> {
    let mut stream = response.bytes_stream();
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::transport(uri.as_str(), e))?;
        trace!(len = chunk.len(), "received chunk");
        if tx.send(WriteMsg::Chunk(chunk)).await.is_err() {
            return Ok(());
        }
    }
    let _ = tx.send(WriteMsg::Finish).await;
    Ok(())
}

fn write_blocking(
    mut rx: mpsc::Receiver<WriteMsg>,
    part: &Path,
    target: &Path,
) -> Result<u64, FetchError> {
    let result = receive_into(&mut rx, part, target);
    if result.is_err() {
        debug!(path = %part.display(), "removing partial file");
        let _ = std::fs::remove_file(part);
    }
    result
}

fn receive_into(
    rx: &mut mpsc::Receiver<WriteMsg>,
    part: &Path,
    target: &Path,
) -> Result<u64, FetchError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(part)
        .map_err(|e| FetchError::io(part, e))?;
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;

    loop {
        match rx.blocking_recv() {
            Some(WriteMsg::Chunk(chunk)) => {
                writer
                    .write_all(&chunk)
                    .map_err(|e| FetchError::io(part, e))?;
                bytes_written += chunk.len() as u64;
            }
            Some(WriteMsg::Finish) => break,
            None => {
                return Err(FetchError::io(
                    part,
                    io::Error::new(
                        io::ErrorKind::Interrupted,
                        "transfer ended before the body was complete",
                    ),
                ));
            }
        }
    }

    let file = writer
        .into_inner()
        .map_err(|e| FetchError::io(part, e.into_error()))?;
    file.sync_all().map_err(|e| FetchError::io(part, e))?;
    drop(file);
    std::fs::rename(part, target).map_err(|e| FetchError::io(target, e))?;
    Ok(bytes_written)
}
