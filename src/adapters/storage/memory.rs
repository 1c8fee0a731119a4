//! In-memory checkpoint store

use super::traits::CheckpointStore;
use crate::core::state::Checkpoint;
use crate::domain::{PerformanceYear, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Checkpoint store that keeps everything in process memory
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    checkpoints: Mutex<BTreeMap<PerformanceYear, Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_map<T>(&self, f: impl FnOnce(&mut BTreeMap<PerformanceYear, Checkpoint>) -> T) -> T {
        let mut map = match self.checkpoints.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut map)
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, year: PerformanceYear) -> Result<Option<Checkpoint>> {
        Ok(self.with_map(|map| map.get(&year).cloned()))
    }

    async fn commit(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.with_map(|map| map.insert(checkpoint.year, checkpoint.clone()));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Checkpoint>> {
        Ok(self.with_map(|map| map.values().cloned().collect()))
    }

    async fn clear(&self, year: PerformanceYear) -> Result<()> {
        self.with_map(|map| map.remove(&year));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryCheckpointStore::new();
        let y2024 = PerformanceYear::new(2024).unwrap();
        let y2023 = PerformanceYear::new(2023).unwrap();

        assert!(store.load(y2024).await.unwrap().is_none());

        store.commit(&Checkpoint::new(y2024)).await.unwrap();
        store.commit(&Checkpoint::new(y2023)).await.unwrap();

        let years: Vec<_> = store.list().await.unwrap().iter().map(|c| c.year).collect();
        assert_eq!(years, vec![y2023, y2024]);

        store.clear(y2024).await.unwrap();
        assert!(store.load(y2024).await.unwrap().is_none());
    }
}
