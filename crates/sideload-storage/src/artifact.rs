//! Single-artifact store.
//!
//! Uploads stream into a uniquely named partial file next to the fixed
//! destination. Only a complete write is renamed over the destination, so a
//! failed or abandoned upload never disturbs the previous artifact.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use sideload_core::config::UploadConfig;
use sideload_core::error::{AppError, ErrorKind};
use sideload_core::result::AppResult;

/// Owns the upload directory and the fixed artifact destination.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Directory holding the artifact and partial files.
    dir: PathBuf,
    /// Fixed artifact path.
    destination: PathBuf,
}

impl ArtifactStore {
    /// Create the store, making sure the upload directory exists.
    pub async fn new(config: &UploadConfig) -> AppResult<Self> {
        let dir = PathBuf::from(&config.data_dir);
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create upload directory: {}", dir.display()),
                e,
            )
        })?;

        Ok(Self {
            destination: config.artifact_path(),
            dir,
        })
    }

    /// Where committed artifacts land.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Start a new partial write.
    pub async fn begin(&self) -> io::Result<ArtifactWriter> {
        let file_name = self
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        let part_path = self
            .dir
            .join(format!("{file_name}.{}.part", Uuid::new_v4().simple()));

        let file = fs::File::create(&part_path).await?;
        debug!(part = %part_path.display(), "Opened partial artifact");

        Ok(ArtifactWriter {
            file: Some(file),
            part_path,
            destination: self.destination.clone(),
            written: 0,
            finished: false,
        })
    }
}

/// Result of a committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReceipt {
    /// Final artifact path.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: u64,
}

/// Why a streamed copy stopped.
#[derive(Debug)]
pub enum CopyError<E> {
    /// The source stream failed (client went away, body limit hit, ...).
    Read(E),
    /// The destination file could not be written.
    Write(io::Error),
}

impl<E: fmt::Display> fmt::Display for CopyError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "read error: {e}"),
            Self::Write(e) => write!(f, "write error: {e}"),
        }
    }
}

/// An in-flight partial artifact.
///
/// Dropping the writer without calling [`ArtifactWriter::commit`] deletes the
/// partial file, which also covers a request future that is cancelled
/// mid-stream.
pub struct ArtifactWriter {
    file: Option<fs::File>,
    part_path: PathBuf,
    destination: PathBuf,
    written: u64,
    finished: bool,
}

impl ArtifactWriter {
    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Path of the partial file.
    pub fn part_path(&self) -> &Path {
        &self.part_path
    }

    /// Append one chunk.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("artifact writer already closed"))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Copy a byte stream chunk by chunk. Memory use is bounded by the
    /// size of a single chunk.
    pub async fn copy_stream<S, E>(&mut self, stream: S) -> Result<u64, CopyError<E>>
    where
        S: Stream<Item = Result<Bytes, E>>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(CopyError::Read)?;
            self.write_chunk(&chunk).await.map_err(CopyError::Write)?;
        }
        Ok(self.written)
    }

    /// Flush the partial file to disk and move it onto the destination.
    pub async fn commit(mut self) -> io::Result<ArtifactReceipt> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| io::Error::other("artifact writer already closed"))?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&self.part_path, &self.destination).await?;
        self.finished = true;

        debug!(
            path = %self.destination.display(),
            bytes = self.written,
            "Committed artifact"
        );

        Ok(ArtifactReceipt {
            path: self.destination.clone(),
            bytes: self.written,
        })
    }

    /// Delete the partial file now instead of on drop.
    pub async fn discard(mut self) {
        drop(self.file.take());
        if let Err(e) = fs::remove_file(&self.part_path).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(part = %self.part_path.display(), error = %e, "Failed to remove partial artifact");
            }
        }
        self.finished = true;
    }
}

impl fmt::Debug for ArtifactWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactWriter")
            .field("part_path", &self.part_path)
            .field("destination", &self.destination)
            .field("written", &self.written)
            .finish()
    }
}

impl Drop for ArtifactWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        drop(self.file.take());
        match std::fs::remove_file(&self.part_path) {
            Ok(()) => debug!(part = %self.part_path.display(), "Dropped partial artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(part = %self.part_path.display(), error = %e, "Failed to remove partial artifact")
            }
        }
    }
}
