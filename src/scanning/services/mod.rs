//! Pure detection and scoring services. No I/O happens here.

pub mod config_auditor;
pub mod dedupe;
pub mod normalizer;
pub mod pattern_scanner;
pub mod query_builder;
pub mod score_calculator;
pub mod severity_mapper;

pub use config_auditor::audit_file;
pub use dedupe::dedupe_vulnerabilities;
pub use normalizer::normalize;
pub use pattern_scanner::{is_scannable, scan_file, PatternScanLimits};
pub use query_builder::{build_queries, ParsedManifest};
pub use score_calculator::security_score;
pub use severity_mapper::{assess, SeverityAssessment};
