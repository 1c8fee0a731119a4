//! Work items: one (NPI, year) lookup

use super::ids::{Npi, PerformanceYear};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit of dispatch for the coordinator
///
/// Built from the cross product of identifiers and years. Retries reuse the
/// same item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    /// Provider identifier
    pub npi: Npi,

    /// Performance year
    pub year: PerformanceYear,

    /// Optional upstream run number (`runNumber` query parameter)
    pub run_number: Option<u32>,
}

impl WorkItem {
    /// Creates a work item using the upstream default run
    pub fn new(npi: Npi, year: PerformanceYear) -> Self {
        Self {
            npi,
            year,
            run_number: None,
        }
    }

    /// Sets the run number
    pub fn with_run_number(mut self, run_number: Option<u32>) -> Self {
        self.run_number = run_number;
        self
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.run_number {
            Some(run) => write!(f, "{}@{}#{}", self.npi, self.year, run),
            None => write!(f, "{}@{}", self.npi, self.year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_work_item_display() {
        let item = WorkItem::new(
            Npi::from_str("1234567890").unwrap(),
            PerformanceYear::new(2023).unwrap(),
        );
        assert_eq!(item.to_string(), "1234567890@2023");

        let item = item.with_run_number(Some(2));
        assert_eq!(item.to_string(), "1234567890@2023#2");
    }
}
