//! Read models for CQRS-lite pattern
//!
//! View-optimized structs that present domain data to formatters.

pub mod scan_report;

pub use scan_report::{RepositoryView, ScanReport};
