//! External system integrations for qpp-extract.
//!
//! - [`qpp`] - CMS QPP Eligibility API client and rate limiter
//! - [`storage`] - Checkpoint stores, staged batches and raw response archive
//! - [`input`] - NPI list reader
//!
//! Checkpoint persistence sits behind the [`storage::CheckpointStore`]
//! trait with file and in-memory implementations.

pub mod input;
pub mod qpp;
pub mod storage;
