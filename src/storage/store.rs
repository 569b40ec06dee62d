use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use super::range::ByteRange;
use super::staging::{StagedUpload, STAGING_SUFFIX};
use crate::auth::{AuthorizedPath, RESERVED_DIR};
use crate::error::StorageError;

/// Subdirectory of [`RESERVED_DIR`] holding in-flight uploads.
pub const UPLOADS_DIR: &str = "uploads";

/// Filesystem-backed store rooted at a single directory.
///
/// Files are written once and never replaced: uploads are staged under
/// `<root>/.fsgate/uploads/` and moved into place with an atomic
/// no-replace rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    staging_dir: PathBuf,
}

/// An opened file (or span of one) ready to stream to a client.
pub struct FileDownload {
    path: String,
    total_size: u64,
    range: Option<ByteRange>,
    reader: ReaderStream<Take<File>>,
}

impl FileDownload {
    /// Size of the whole file.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// The span being served, if the request asked for one.
    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    /// Number of body bytes the stream will yield.
    pub fn content_length(&self) -> u64 {
        self.range.map(|r| r.len()).unwrap_or(self.total_size)
    }

    /// Convert into a byte stream. Read errors end the stream and are logged,
    /// since the response status has already been sent by then.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        let path = self.path;
        self.reader.inspect_err(move |err| {
            error!(path = %path, error = %err, "Download stream aborted");
        })
    }
}

impl FileStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let staging_dir = root.join(RESERVED_DIR).join(UPLOADS_DIR);
        Self { root, staging_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Location of an authorized path on disk.
    pub fn resolve(&self, path: &AuthorizedPath) -> PathBuf {
        path.segments()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// Open a stored file for download, optionally restricted to the span
    /// described by a `Range` header value.
    pub async fn open(
        &self,
        path: &AuthorizedPath,
        range_header: Option<&str>,
    ) -> Result<FileDownload, StorageError> {
        let target = self.resolve(path);

        let mut file = match File::open(&target).await {
            Ok(file) => file,
            // A regular file in place of a parent directory means the target
            // cannot exist either.
            Err(err) if is_absent(&err) => {
                return Err(StorageError::NotFound(path.to_string()))
            }
            Err(err) => return Err(StorageError::io("opening file", err)),
        };

        let metadata = file
            .metadata()
            .await
            .map_err(|e| StorageError::io("reading file metadata", e))?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let total_size = metadata.len();

        let range = range_header
            .map(|header| ByteRange::parse(header, total_size))
            .transpose()?;

        let (offset, length) = match range {
            Some(range) => (range.start, range.len()),
            None => (0, total_size),
        };

        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .await
                .map_err(|e| StorageError::io("seeking file", e))?;
        }

        debug!(
            path = %path,
            total_size,
            offset,
            length,
            "Opened file for download"
        );

        Ok(FileDownload {
            path: path.to_string(),
            total_size,
            range,
            reader: ReaderStream::new(file.take(length)),
        })
    }

    /// Store an upload body at `path`, returning the number of bytes written.
    ///
    /// The body is staged first and only becomes visible at `path` through a
    /// single atomic rename. If a file exists at `path` before or after
    /// staging, the upload fails with [`StorageError::Conflict`]. On any
    /// failure the staged file is removed and nothing is left at `path`.
    pub async fn store<S, E>(&self, path: &AuthorizedPath, body: S) -> Result<u64, StorageError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let destination = self.resolve(path);

        if self.exists(&destination).await? {
            return Err(StorageError::Conflict(path.to_string()));
        }

        let mut staged = StagedUpload::create(&self.staging_dir)
            .await
            .map_err(|e| StorageError::io("creating staging file", e))?;

        let mut body = std::pin::pin!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| StorageError::io("reading request body", io::Error::other(e)))?;
            if chunk.is_empty() {
                continue;
            }
            staged
                .write_chunk(&chunk)
                .await
                .map_err(|e| StorageError::io("writing staging file", e))?;
        }

        staged
            .finish()
            .await
            .map_err(|e| StorageError::io("syncing staging file", e))?;

        // Another upload may have published the same path while this one was
        // staging.
        if self.exists(&destination).await? {
            return Err(StorageError::Conflict(path.to_string()));
        }

        if let Some(parent) = destination.parent() {
            match fs::create_dir_all(parent).await {
                Ok(()) => {}
                Err(err) if is_blocked(&err) => {
                    return Err(StorageError::Conflict(path.to_string()))
                }
                Err(err) => return Err(StorageError::io("creating parent directories", err)),
            }
        }

        let written = staged.written();
        match staged.publish(&destination).await {
            Ok(()) => {
                info!(path = %path, bytes = written, "Stored file");
                Ok(written)
            }
            Err(err) if is_blocked(&err) => Err(StorageError::Conflict(path.to_string())),
            Err(err) => Err(StorageError::io("publishing upload", err)),
        }
    }

    /// Create the staging directory if it does not exist yet.
    pub async fn prepare(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|e| StorageError::io("creating staging directory", e))
    }

    /// Remove staging files left behind by a previous process.
    ///
    /// Only safe to call while no uploads are in flight, i.e. at startup.
    pub async fn sweep_staging(&self) -> Result<usize, StorageError> {
        let mut entries = match fs::read_dir(&self.staging_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(StorageError::io("listing staging directory", err)),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io("listing staging directory", e))?
        {
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(STAGING_SUFFIX) {
                continue;
            }
            fs::remove_file(entry.path())
                .await
                .map_err(|e| StorageError::io("removing stale staging file", e))?;
            removed += 1;
        }

        if removed > 0 {
            info!(removed, "Removed stale staging files");
        }
        Ok(removed)
    }

    /// Verify the root accepts writes by staging and discarding a probe file.
    pub async fn check_writable(&self) -> Result<(), StorageError> {
        let mut probe = StagedUpload::create(&self.staging_dir)
            .await
            .map_err(|e| StorageError::io("creating staging file", e))?;
        probe
            .write_chunk(b"probe")
            .await
            .map_err(|e| StorageError::io("writing staging file", e))?;
        probe
            .finish()
            .await
            .map_err(|e| StorageError::io("syncing staging file", e))?;
        Ok(())
    }

    /// Whether something already occupies `path`, including a regular file
    /// standing where one of its parent directories would go.
    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::try_exists(path).await {
            Ok(exists) => Ok(exists),
            Err(err) if err.kind() == io::ErrorKind::NotADirectory => Ok(true),
            Err(err) => Err(StorageError::io("checking destination", err)),
        }
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn is_blocked(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::AlreadyExists | io::ErrorKind::NotADirectory
    )
}
