use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Suffix carried by every staging file.
pub const STAGING_SUFFIX: &str = ".tmp";

/// An upload being written to the staging directory.
///
/// The staged file is deleted when the guard is dropped unless
/// [`StagedUpload::publish`] moved it to its final name first. This covers
/// every failure path, including the request future being dropped when the
/// client disconnects.
pub struct StagedUpload {
    file: Option<File>,
    path: Option<TempPath>,
    written: u64,
}

impl StagedUpload {
    /// Create a uniquely named staging file inside `staging_dir`, creating the
    /// directory if needed.
    pub async fn create(staging_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(staging_dir).await?;

        let dir = staging_dir.to_path_buf();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&Uuid::new_v4().to_string())
                .suffix(STAGING_SUFFIX)
                .rand_bytes(0)
                .tempfile_in(dir)
        })
        .await
        .map_err(io::Error::other)??;

        let (file, path) = named.into_parts();
        debug!(staging_path = %path.display(), "Staging upload");

        Ok(Self {
            file: Some(File::from_std(file)),
            path: Some(path),
            written: 0,
        })
    }

    /// Location of the staged file, while it still exists.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append a chunk of the upload body.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(closed_error)?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush and sync the staged bytes, then close the file handle.
    pub async fn finish(&mut self) -> io::Result<()> {
        let mut file = self.file.take().ok_or_else(closed_error)?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Atomically move the staged file to `destination`.
    ///
    /// Fails with [`io::ErrorKind::AlreadyExists`] if anything already exists
    /// at `destination`; the staged file is removed in that case as well.
    pub async fn publish(mut self, destination: &Path) -> io::Result<()> {
        let path = self.path.take().ok_or_else(closed_error)?;
        let destination: PathBuf = destination.to_path_buf();

        tokio::task::spawn_blocking(move || match path.persist_noclobber(&destination) {
            Ok(()) => Ok(()),
            Err(err) => {
                discard(err.path);
                Err(err.error)
            }
        })
        .await
        .map_err(io::Error::other)?
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        self.file.take();
        if let Some(path) = self.path.take() {
            discard(path);
        }
    }
}

fn discard(path: TempPath) {
    let staged = path.display().to_string();
    match path.close() {
        Ok(()) => debug!(staging_path = %staged, "Removed staged upload"),
        Err(err) => warn!(
            staging_path = %staged,
            error = %err,
            "Failed to remove staged upload"
        ),
    }
}

fn closed_error() -> io::Error {
    io::Error::other("staged upload already closed")
}
