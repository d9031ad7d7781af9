/// Mock implementations for testing
mod mock_progress_reporter;
mod mock_scan_store;
mod mock_source_host;
mod mock_vulnerability_database;

pub use mock_progress_reporter::MockProgressReporter;
pub use mock_scan_store::MockScanStore;
pub use mock_source_host::MockSourceHost;
pub use mock_vulnerability_database::MockVulnerabilityDatabase;
