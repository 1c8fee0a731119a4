//! Checkpoint model and state management

pub mod checkpoint;
pub mod manager;

pub use checkpoint::{Checkpoint, CheckpointStatus};
pub use manager::StateManager;
