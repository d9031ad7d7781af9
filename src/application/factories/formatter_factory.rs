use crate::adapters::outbound::formatters::{JsonReportFormatter, MarkdownReportFormatter};
use crate::application::dto::OutputFormat;
use crate::ports::outbound::ScanReportFormatter;

/// Factory for creating scan report formatters
///
/// Selects the formatter adapter for the format requested on the command
/// line, keeping the CLI unaware of concrete adapter types.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter instance for the specified output format
    ///
    /// # Examples
    /// ```
    /// use reposcan::application::dto::OutputFormat;
    /// use reposcan::application::factories::FormatterFactory;
    ///
    /// let formatter = FormatterFactory::create(OutputFormat::Markdown);
    /// ```
    pub fn create(format: OutputFormat) -> Box<dyn ScanReportFormatter> {
        match format {
            OutputFormat::Json => Box::new(JsonReportFormatter::new()),
            OutputFormat::Markdown => Box::new(MarkdownReportFormatter::new()),
        }
    }

    /// Progress line shown while the report is rendered
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Json => "📝 Rendering JSON scan report...",
            OutputFormat::Markdown => "📝 Rendering Markdown scan report...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::read_models::ScanReport;
    use crate::scanning::domain::{RepositoryRef, ScanResult, ScanType, SeverityCounts};
    use chrono::Utc;
    use uuid::Uuid;

    fn empty_report() -> ScanReport {
        let repository = RepositoryRef::parse("https://github.com/octo/demo", None).unwrap();
        let result = ScanResult {
            scan_id: Uuid::new_v4(),
            repository_id: Uuid::new_v4(),
            security_score: 100,
            severity_counts: SeverityCounts::default(),
            vulnerabilities: vec![],
            duration_ms: 12,
            timestamp: Utc::now(),
            degraded_sources: vec![],
        };
        ScanReport::new(&repository, ScanType::Full, &result)
    }

    #[test]
    fn test_json_formatter_selected() {
        let output = FormatterFactory::create(OutputFormat::Json)
            .format(&empty_report())
            .unwrap();
        assert!(output.trim_start().starts_with('{'));
    }

    #[test]
    fn test_markdown_formatter_selected() {
        let output = FormatterFactory::create(OutputFormat::Markdown)
            .format(&empty_report())
            .unwrap();
        assert!(output.starts_with("# "));
    }

    #[test]
    fn test_progress_messages_differ() {
        assert_ne!(
            FormatterFactory::progress_message(OutputFormat::Json),
            FormatterFactory::progress_message(OutputFormat::Markdown)
        );
    }
}
