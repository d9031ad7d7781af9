/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (code host, vulnerability database,
/// storage, console).
pub mod output_presenter;
pub mod progress_reporter;
pub mod report_formatter;
pub mod scan_store;
pub mod source_host;
pub mod vulnerability_database;

pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use report_formatter::ScanReportFormatter;
pub use scan_store::ScanStore;
pub use source_host::{SourceHost, TreeEntry, TreeEntryKind};
pub use vulnerability_database::{BatchResponse, VulnerabilityDatabase};
