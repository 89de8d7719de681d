//! The `.part` file backing a single transfer attempt.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::Instant;
use tracing::debug;

use super::error::DownloadError;
use super::progress::TransferProgress;

/// Temporary file for one attempt.
///
/// Bytes go to `<final>.part`; [`commit`](Self::commit) flushes, syncs and
/// renames it onto the final path. A session dropped without committing
/// removes its temporary file, so no code path leaves partial data behind.
#[derive(Debug)]
pub(crate) struct TransferSession {
    part_path: PathBuf,
    file: Option<BufWriter<File>>,
    bytes_transferred: u64,
    total_bytes: Option<u64>,
    started: Instant,
    finished: bool,
}

impl TransferSession {
    /// Creates (truncating) the temporary file.
    pub(crate) async fn create(
        part_path: PathBuf,
        total_bytes: Option<u64>,
    ) -> Result<Self, DownloadError> {
        let file = File::create(&part_path)
            .await
            .map_err(|e| DownloadError::io(part_path.clone(), e))?;
        Ok(Self {
            part_path,
            file: Some(BufWriter::new(file)),
            bytes_transferred: 0,
            total_bytes,
            started: Instant::now(),
            finished: false,
        })
    }

    pub(crate) async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), DownloadError> {
        let Some(writer) = self.file.as_mut() else {
            return Err(closed_error(&self.part_path));
        };
        writer
            .write_all(chunk)
            .await
            .map_err(|e| DownloadError::io(self.part_path.clone(), e))?;
        self.bytes_transferred += chunk.len() as u64;
        Ok(())
    }

    pub(crate) fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub(crate) fn started(&self) -> Instant {
        self.started
    }

    pub(crate) fn progress(&self) -> TransferProgress {
        TransferProgress {
            bytes_so_far: self.bytes_transferred,
            total_bytes: self.total_bytes,
            elapsed: self.started.elapsed(),
        }
    }

    /// Flushes and syncs the temporary file, then renames it to `final_path`.
    pub(crate) async fn commit(mut self, final_path: &Path) -> Result<u64, DownloadError> {
        let Some(mut writer) = self.file.take() else {
            return Err(closed_error(&self.part_path));
        };
        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(self.part_path.clone(), e))?;
        let file = writer.into_inner();
        file.sync_all()
            .await
            .map_err(|e| DownloadError::io(self.part_path.clone(), e))?;
        drop(file);

        tokio::fs::rename(&self.part_path, final_path)
            .await
            .map_err(|e| DownloadError::io(final_path.to_path_buf(), e))?;
        self.finished = true;
        debug!(
            path = %final_path.display(),
            bytes = self.bytes_transferred,
            "published archive"
        );
        Ok(self.bytes_transferred)
    }

    /// Closes and removes the temporary file.
    pub(crate) async fn discard(mut self) {
        drop(self.file.take());
        remove_part_file(&self.part_path).await;
        self.finished = true;
    }
}

impl Drop for TransferSession {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.file.take());
            let _ = std::fs::remove_file(&self.part_path);
        }
    }
}

/// Removes `path` if it exists; absence is not an error.
pub(crate) async fn remove_part_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed temporary file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!(path = %path.display(), error = %e, "could not remove temporary file"),
    }
}

fn closed_error(path: &Path) -> DownloadError {
    DownloadError::io(
        path.to_path_buf(),
        std::io::Error::other("transfer file already closed"),
    )
}
