use crate::application::read_models::ScanReport;
use crate::ports::outbound::ScanReportFormatter;
use crate::scanning::domain::{Severity, Vulnerability, VulnerabilityType};
use crate::shared::Result;

/// Markdown table header for the findings list
const FINDINGS_TABLE_HEADER: &str = "| Severity | Type | Title | Location | CVE | Fixed Version |\n";

/// Markdown table separator line for the findings list
const FINDINGS_TABLE_SEPARATOR: &str = "|----------|------|-------|----------|-----|---------------|\n";

/// MarkdownReportFormatter adapter for a human-readable scan report
///
/// Renders a summary table followed by one findings table per severity
/// tier, most severe first.
#[derive(Default)]
pub struct MarkdownReportFormatter;

impl MarkdownReportFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Escapes pipe characters and newlines for safe Markdown table rendering
    fn escape_markdown_table_cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }

    fn render_header(&self, output: &mut String, report: &ScanReport) {
        output.push_str("# Repository Security Scan Report\n\n");
        output.push_str(&format!(
            "**Repository:** [{}/{}]({}) · **Branch:** `{}` · **Scan type:** {}\n\n",
            report.repository.owner,
            report.repository.name,
            report.repository.url,
            report.repository.branch,
            report.scan_type
        ));
    }

    fn render_summary(&self, output: &mut String, report: &ScanReport) {
        let summary = &report.summary;
        output.push_str("## Summary\n\n");
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        output.push_str(&format!("| Security score | {}/100 |\n", summary.security_score));
        output.push_str(&format!(
            "| Total vulnerabilities | {} |\n",
            summary.total_vulnerabilities
        ));
        output.push_str(&format!("| Critical | {} |\n", summary.critical_count));
        output.push_str(&format!("| High | {} |\n", summary.high_count));
        output.push_str(&format!("| Medium | {} |\n", summary.medium_count));
        output.push_str(&format!("| Low | {} |\n", summary.low_count));
        output.push_str(&format!("| Duration | {} ms |\n", summary.scan_duration));
        output.push_str(&format!(
            "| Scanned at | {} |\n\n",
            summary.scan_timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        if !report.degraded_sources.is_empty() {
            output.push_str(&format!(
                "> ⚠️ Some detection sources were unavailable during this scan: {}. \
                 Results may be incomplete.\n\n",
                report.degraded_sources.join(", ")
            ));
        }
    }

    fn render_findings(&self, output: &mut String, vulnerabilities: &[Vulnerability]) {
        output.push_str("## Findings\n\n");
        if vulnerabilities.is_empty() {
            output.push_str("*No vulnerabilities found*\n");
            return;
        }

        for severity in Severity::ALL {
            let tier: Vec<&Vulnerability> = vulnerabilities
                .iter()
                .filter(|v| v.severity() == severity)
                .collect();
            if tier.is_empty() {
                continue;
            }
            output.push_str(&format!("### {} ({})\n\n", severity, tier.len()));
            output.push_str(FINDINGS_TABLE_HEADER);
            output.push_str(FINDINGS_TABLE_SEPARATOR);
            for vulnerability in tier {
                self.render_finding_row(output, vulnerability);
            }
            output.push('\n');
        }

        if vulnerabilities
            .iter()
            .any(|v| v.vulnerability_type() == VulnerabilityType::Dependency)
        {
            output.push_str("---\n\n");
            output.push_str(
                "*Vulnerability data provided by [OSV](https://osv.dev) under CC-BY 4.0*\n",
            );
        }
    }

    fn render_finding_row(&self, output: &mut String, vulnerability: &Vulnerability) {
        let location = match (vulnerability.affected_component(), vulnerability.affected_version()) {
            (Some(component), Some(version)) => format!("{}@{}", component, version),
            (Some(component), None) => component.to_string(),
            _ => "-".to_string(),
        };
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            vulnerability.severity(),
            vulnerability.vulnerability_type(),
            Self::escape_markdown_table_cell(vulnerability.title()),
            Self::escape_markdown_table_cell(&location),
            vulnerability.cve_id().unwrap_or("-"),
            Self::escape_markdown_table_cell(vulnerability.fixed_version().unwrap_or("-")),
        ));
    }
}

impl ScanReportFormatter for MarkdownReportFormatter {
    fn format(&self, report: &ScanReport) -> Result<String> {
        let mut output = String::new();
        self.render_header(&mut output, report);
        self.render_summary(&mut output, report);
        self.render_findings(&mut output, &report.vulnerabilities);
        Ok(output)
    }
}
