use super::severity::Severity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Detection source that produced a vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnerabilityType {
    Dependency,
    Code,
    Configuration,
}

impl fmt::Display for VulnerabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VulnerabilityType::Dependency => "dependency",
            VulnerabilityType::Code => "code",
            VulnerabilityType::Configuration => "configuration",
        };
        write!(f, "{}", s)
    }
}

/// Source-specific record before normalization.
///
/// Detection branches fill a draft; only the normalizer turns it into a
/// [`Vulnerability`] by stamping an identifier and a type.
#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityDraft {
    pub cve_id: Option<String>,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub affected_component: Option<String>,
    pub affected_version: Option<String>,
    pub fixed_version: Option<String>,
    pub cvss_score: Option<f64>,
    pub references: Vec<String>,
    pub raw_data: Value,
}

impl VulnerabilityDraft {
    pub fn new(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            cve_id: None,
            severity,
            title: title.into(),
            description: description.into(),
            affected_component: None,
            affected_version: None,
            fixed_version: None,
            cvss_score: None,
            references: Vec::new(),
            raw_data: Value::Null,
        }
    }
}

/// Canonical vulnerability entity, owned by the scan that produced it
///
/// Serializes with the persisted record field names (`cve_id`,
/// `vulnerability_type`, ...), inside reports as well as in storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vulnerability {
    id: String,
    cve_id: Option<String>,
    vulnerability_type: VulnerabilityType,
    severity: Severity,
    title: String,
    description: String,
    affected_component: Option<String>,
    affected_version: Option<String>,
    fixed_version: Option<String>,
    cvss_score: Option<f64>,
    references: Vec<String>,
    raw_data: Value,
}

impl Vulnerability {
    pub fn from_draft(id: String, vulnerability_type: VulnerabilityType, draft: VulnerabilityDraft) -> Self {
        Self {
            id,
            cve_id: draft.cve_id,
            vulnerability_type,
            severity: draft.severity,
            title: draft.title,
            description: draft.description,
            affected_component: draft.affected_component,
            affected_version: draft.affected_version,
            fixed_version: draft.fixed_version,
            cvss_score: draft.cvss_score,
            references: draft.references,
            raw_data: draft.raw_data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cve_id(&self) -> Option<&str> {
        self.cve_id.as_deref()
    }

    pub fn vulnerability_type(&self) -> VulnerabilityType {
        self.vulnerability_type
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn affected_component(&self) -> Option<&str> {
        self.affected_component.as_deref()
    }

    pub fn affected_version(&self) -> Option<&str> {
        self.affected_version.as_deref()
    }

    pub fn fixed_version(&self) -> Option<&str> {
        self.fixed_version.as_deref()
    }

    pub fn cvss_score(&self) -> Option<f64> {
        self.cvss_score
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn raw_data(&self) -> &Value {
        &self.raw_data
    }
}
