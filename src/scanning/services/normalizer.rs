use super::severity_mapper;
use crate::scanning::domain::{
    CodeFinding, ConfigFinding, DependencyMatch, Vulnerability, VulnerabilityDraft,
    VulnerabilityType,
};
use uuid::Uuid;

/// Merges the three detection sources into one ordered list of canonical vulnerabilities.
///
/// Every record gets a fresh identifier and its source type. Order is
/// dependencies, then code, then configuration; within a source the input
/// order is preserved. No cross-source deduplication happens here.
pub fn normalize(
    dependencies: &[DependencyMatch],
    code: &[CodeFinding],
    config: &[ConfigFinding],
) -> Vec<Vulnerability> {
    let dependency_drafts = dependencies
        .iter()
        .map(|m| (VulnerabilityType::Dependency, dependency_draft(m)));
    let code_drafts = code
        .iter()
        .map(|f| (VulnerabilityType::Code, code_draft(f)));
    let config_drafts = config
        .iter()
        .map(|f| (VulnerabilityType::Configuration, config_draft(f)));

    dependency_drafts
        .chain(code_drafts)
        .chain(config_drafts)
        .map(|(kind, draft)| Vulnerability::from_draft(Uuid::new_v4().to_string(), kind, draft))
        .collect()
}

pub fn dependency_draft(matched: &DependencyMatch) -> VulnerabilityDraft {
    let record = &matched.record;
    let assessment = severity_mapper::assess(record);

    let description = record
        .details
        .clone()
        .or_else(|| record.summary.clone())
        .unwrap_or_default();

    let mut draft = VulnerabilityDraft::new(assessment.severity, record.title(), description);
    draft.cve_id = record.cve_id().map(str::to_string);
    draft.affected_component = Some(matched.query.name().to_string());
    draft.affected_version = matched.query.version().map(str::to_string);
    draft.fixed_version = record
        .fixed_version_for(matched.query.name())
        .map(str::to_string);
    draft.cvss_score = assessment.cvss_score;
    draft.references = record.references.clone();
    draft.raw_data = record.raw.clone();
    draft
}

pub fn code_draft(finding: &CodeFinding) -> VulnerabilityDraft {
    let description = format!(
        "{} ({}:{})",
        finding.description, finding.file_path, finding.line
    );
    let mut draft = VulnerabilityDraft::new(finding.severity, finding.title.clone(), description);
    draft.affected_component = Some(finding.file_path.clone());
    draft.references = finding.references.clone();
    draft.raw_data = serde_json::to_value(finding).unwrap_or_default();
    draft
}

pub fn config_draft(finding: &ConfigFinding) -> VulnerabilityDraft {
    let description = match finding.line {
        Some(line) => format!("{} ({}:{})", finding.description, finding.file_path, line),
        None => format!("{} ({})", finding.description, finding.file_path),
    };
    let mut draft = VulnerabilityDraft::new(finding.severity, finding.title.clone(), description);
    draft.affected_component = Some(finding.file_path.clone());
    draft.raw_data = serde_json::to_value(finding).unwrap_or_default();
    draft
}
