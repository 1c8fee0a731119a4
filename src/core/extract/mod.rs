//! Extraction orchestration and batch processing
//!
//! This module provides the core extraction logic, including:
//! - Batch processing of work items through a bounded worker pool
//! - Year loops with checkpointing and cooperative shutdown
//! - Summary and reporting

pub mod batch;
pub mod coordinator;
pub mod summary;

pub use batch::{BatchProcessor, BatchResult};
pub use coordinator::{ExtractionCoordinator, Progress, YearPlan};
pub use summary::{RunError, RunErrorType, RunState, RunSummary, YearSummary};
