use crate::application::read_models::ScanReport;
use crate::shared::Result;

/// ScanReportFormatter port for rendering a finished scan
///
/// This port abstracts the output format (JSON, Markdown, etc.).
pub trait ScanReportFormatter {
    /// Renders the report
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, report: &ScanReport) -> Result<String>;
}
