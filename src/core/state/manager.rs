//! State manager for checkpoint persistence
//!
//! This module provides the StateManager for loading and committing
//! per-year checkpoints through a [`CheckpointStore`].

use crate::adapters::storage::CheckpointStore;
use crate::core::state::checkpoint::Checkpoint;
use crate::domain::{Npi, PerformanceYear, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

/// State manager for checkpoint persistence
///
/// Each year has a single writer (its year loop), so the manager adds no
/// locking of its own.
pub struct StateManager {
    /// Checkpoint storage backend
    store: Arc<dyn CheckpointStore + Send + Sync>,
}

impl StateManager {
    /// Create a new StateManager with a checkpoint store
    pub fn new(store: Arc<dyn CheckpointStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Load the checkpoint for a year
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(Checkpoint))` if found, `Ok(None)` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a saved checkpoint cannot be read.
    pub async fn load(&self, year: PerformanceYear) -> Result<Option<Checkpoint>> {
        self.store.load(year).await
    }

    /// Load the checkpoint for a year, or start a fresh one
    ///
    /// # Errors
    ///
    /// Returns an error if a saved checkpoint cannot be read.
    pub async fn load_or_new(&self, year: PerformanceYear) -> Result<Checkpoint> {
        Ok(self
            .store
            .load(year)
            .await?
            .unwrap_or_else(|| Checkpoint::new(year)))
    }

    /// NPIs already processed for a year
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint cannot be read.
    pub async fn completed(&self, year: PerformanceYear) -> Result<BTreeSet<Npi>> {
        Ok(self
            .store
            .load(year)
            .await?
            .map(|checkpoint| checkpoint.completed)
            .unwrap_or_default())
    }

    /// Save a checkpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.store.commit(checkpoint).await
    }

    /// Get all saved checkpoints in year order
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn all(&self) -> Result<Vec<Checkpoint>> {
        self.store.list().await
    }

    /// Remove the checkpoint for a year
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    pub async fn clear(&self, year: PerformanceYear) -> Result<()> {
        self.store.clear(year).await
    }

    /// Checkpoint a committed batch
    ///
    /// Same as [`save`](Self::save) with explicit checkpoint semantics.
    /// Called after a batch's rows are staged.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint fails.
    pub async fn checkpoint_batch(&self, checkpoint: &Checkpoint) -> Result<()> {
        tracing::info!(
            year = %checkpoint.year,
            batches = checkpoint.batches_committed,
            completed = checkpoint.completed_count(),
            "Checkpointing batch"
        );

        self.save(checkpoint).await
    }
}
