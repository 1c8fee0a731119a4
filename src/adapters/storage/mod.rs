//! Local persistence: checkpoints, staged batches and the raw archive
//!
//! - [`traits`] - the [`CheckpointStore`] abstraction
//! - [`file`] - JSON files, one per year
//! - [`memory`] - in-process store for tests and embedding
//! - [`staging`] - per-batch JSON Lines files of normalized rows
//! - [`raw`] - archive of successful response bodies
//!
//! Every file is written through [`write_atomic`]: a temp file next to the
//! target is written, fsynced and renamed over it. On Unix the directory is
//! fsynced after the rename as well.

pub mod file;
pub mod memory;
pub mod raw;
pub mod staging;
pub mod traits;

pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;
pub use raw::RawArchive;
pub use staging::{StagedEntry, StagingArea};
pub use traits::CheckpointStore;

use crate::domain::{ExtractError, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Replaces `path` with `contents` so readers never see a partial file
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let persistence = |action: &str, target: &Path, e: std::io::Error| {
        ExtractError::Persistence(format!("Failed to {action} {}: {e}", target.display()))
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| persistence("create directory", parent, e))?;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("output");
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| persistence("create", &tmp_path, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| persistence("write", &tmp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| persistence("sync", &tmp_path, e))?;
    drop(file);

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| persistence("rename into place", path, e))?;

    if let Some(parent) = path.parent() {
        sync_dir(parent)
            .await
            .map_err(|e| persistence("sync directory", parent, e))?;
    }
    Ok(())
}

/// Persists a rename by fsyncing the directory holding the entry
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    // An empty parent means the current directory
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
