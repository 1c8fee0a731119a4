//! Input files

pub mod npi_reader;

pub use npi_reader::{NpiList, NpiReadStats, NpiReader, RejectedNpi};
