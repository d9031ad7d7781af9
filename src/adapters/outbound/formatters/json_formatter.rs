use crate::application::read_models::ScanReport;
use crate::ports::outbound::ScanReportFormatter;
use crate::shared::Result;
use anyhow::Context;

/// JsonReportFormatter adapter rendering the scan response contract
///
/// Summary fields sit at the top level (`success`, `scanId`, `securityScore`,
/// counts, duration, timestamp), followed by repository details and the
/// vulnerability list.
#[derive(Default)]
pub struct JsonReportFormatter;

impl JsonReportFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl ScanReportFormatter for JsonReportFormatter {
    fn format(&self, report: &ScanReport) -> Result<String> {
        serde_json::to_string_pretty(report).context("Failed to serialize scan report to JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::domain::{
        RepositoryRef, ScanResult, ScanType, Severity, SeverityCounts, Vulnerability,
        VulnerabilityDraft, VulnerabilityType,
    };
    use chrono::Utc;
    use serde_json::Value;
    use uuid::Uuid;

    fn report() -> ScanReport {
        let repository =
            RepositoryRef::parse("https://github.com/octo/demo/tree/develop", None).unwrap();
        let mut draft = VulnerabilityDraft::new(Severity::Critical, "Prototype pollution", "details");
        draft.cve_id = Some("CVE-2019-10744".to_string());
        draft.affected_component = Some("lodash".to_string());
        let result = ScanResult {
            scan_id: Uuid::new_v4(),
            repository_id: Uuid::new_v4(),
            security_score: 75,
            severity_counts: SeverityCounts::new(1, 0, 0, 0),
            vulnerabilities: vec![Vulnerability::from_draft(
                "v-1".to_string(),
                VulnerabilityType::Dependency,
                draft,
            )],
            duration_ms: 840,
            timestamp: Utc::now(),
            degraded_sources: vec!["source-tree".to_string()],
        };
        ScanReport::new(&repository, ScanType::Quick, &result)
    }

    #[test]
    fn test_response_contract_fields_at_top_level() {
        let json: Value =
            serde_json::from_str(&JsonReportFormatter::new().format(&report()).unwrap()).unwrap();
        for key in [
            "success",
            "scanId",
            "securityScore",
            "totalVulnerabilities",
            "criticalCount",
            "highCount",
            "mediumCount",
            "lowCount",
            "scanDuration",
            "scanTimestamp",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["success"], true);
        assert_eq!(json["securityScore"], 75);
        assert_eq!(json["scanDuration"], 840);
    }

    #[test]
    fn test_report_details() {
        let json: Value =
            serde_json::from_str(&JsonReportFormatter::new().format(&report()).unwrap()).unwrap();
        assert_eq!(json["repository"]["branch"], "develop");
        assert_eq!(json["scanType"], "quick");
        assert_eq!(json["degradedSources"][0], "source-tree");
        let vuln = &json["vulnerabilities"][0];
        assert_eq!(vuln["severity"], "CRITICAL");
        assert_eq!(vuln["vulnerability_type"], "dependency");
        assert_eq!(vuln["cve_id"], "CVE-2019-10744");
    }
}
