// QPP Extract - CMS QPP Eligibility Extraction Tool
// Copyright (c) 2025 QPP Extract Contributors
// Licensed under the MIT License

//! # QPP Extract - CMS QPP Eligibility Extraction
//!
//! QPP Extract pulls provider eligibility records from the CMS Quality
//! Payment Program Eligibility API for a list of NPIs across several
//! performance years and flattens them into six relational CSV tables.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fetching** eligibility records through a rate-limited, retrying client
//! - **Normalizing** nested JSON into provider, organization, scenario, APM
//!   and virtual group rows
//! - **Checkpointing** per-year progress so interrupted runs resume
//! - **Exporting** CSV tables with a data dictionary and summaries
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (normalize, extract, state, export)
//! - [`adapters`] - External integrations (QPP API, storage, NPI input)
//! - [`domain`] - Core domain types and statistics
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Normalization
//!
//! The normalizer is pure; the same record always yields the same rows:
//!
//! ```rust
//! use qpp_extract::core::normalize::{Normalizer, TableKind};
//! use qpp_extract::domain::{Npi, PerformanceYear, RawRecord, WorkItem};
//! use serde_json::json;
//!
//! let item = WorkItem::new(
//!     Npi::new("1234567890").unwrap(),
//!     PerformanceYear::new(2024).unwrap(),
//! );
//! let body = json!({
//!     "npi": "1234567890",
//!     "firstName": "Jane",
//!     "lastName": "Doe",
//!     "organizations": [{"TIN": "XXXXX1234"}]
//! });
//! let raw = RawRecord::success(item, body, chrono::Utc::now());
//!
//! let result = Normalizer::new().normalize(&raw);
//! assert_eq!(result.record.count(TableKind::Providers), 1);
//! assert_eq!(result.record.count(TableKind::Organizations), 1);
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`] with a
//! [`domain::ExtractError`]. Per-lookup API failures are not errors; they
//! are classified on the returned record and counted in the run statistics.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
