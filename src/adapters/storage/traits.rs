//! Checkpoint storage abstraction
//!
//! The coordinator talks to checkpoints only through [`CheckpointStore`],
//! so the file-backed store used in production and the in-memory store
//! used for dry runs and tests are interchangeable.

use crate::core::state::Checkpoint;
use crate::domain::{PerformanceYear, Result};
use async_trait::async_trait;

/// Persistent store of per-year checkpoints
///
/// A store holds at most one checkpoint per year. Implementations must make
/// [`commit`](CheckpointStore::commit) atomic: after a crash a reader sees
/// either the previous checkpoint or the new one, never a partial write.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint for a year
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(Checkpoint))` if one was saved, `Ok(None)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if a saved checkpoint cannot be read or
    /// decoded.
    async fn load(&self, year: PerformanceYear) -> Result<Option<Checkpoint>>;

    /// Save a checkpoint, replacing any previous one for its year
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the write fails.
    async fn commit(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// All saved checkpoints in year order
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the store cannot be listed or a
    /// checkpoint cannot be decoded.
    async fn list(&self) -> Result<Vec<Checkpoint>>;

    /// Remove the checkpoint for a year; a missing checkpoint is not an error
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the removal fails.
    async fn clear(&self, year: PerformanceYear) -> Result<()>;
}
