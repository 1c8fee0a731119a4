//! Domain models and types
//!
//! Identifiers, work items, raw records, run statistics and the error
//! hierarchy shared by every other module.

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;
pub mod stats;
pub mod work;

// Re-export commonly used types
pub use errors::{ApiError, ExtractError};
pub use ids::{Npi, PerformanceYear};
pub use record::{FetchOutcome, RawRecord};
pub use result::Result;
pub use stats::{CounterSnapshot, RunStatistics};
pub use work::WorkItem;
