use super::package_query::PackageQuery;
use serde_json::Value;

/// One severity descriptor of an advisory, e.g. `("CVSS_V3", "CVSS:3.1/AV:N/...")`
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityDescriptor {
    pub kind: String,
    pub score: String,
}

/// Package range block of an advisory, reduced to what the engine reads
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AffectedPackage {
    pub name: Option<String>,
    pub ecosystem: Option<String>,
    pub fixed_versions: Vec<String>,
}

/// Advisory record as received from the vulnerability database.
///
/// Validated at the adapter boundary; immutable afterwards. `raw` keeps the
/// original JSON document so it can be carried into `raw_data`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVulnerabilityRecord {
    pub id: String,
    pub summary: Option<String>,
    pub details: Option<String>,
    pub aliases: Vec<String>,
    pub severity: Vec<SeverityDescriptor>,
    /// Secondary numeric score published by the source (`database_specific.cvss_score`)
    pub secondary_score: Option<f64>,
    /// Source-provided label (`database_specific.severity`)
    pub severity_label: Option<String>,
    pub references: Vec<String>,
    pub affected: Vec<AffectedPackage>,
    pub raw: Value,
}

impl RawVulnerabilityRecord {
    /// Minimal record, mostly useful for tests and adapters building records incrementally
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: None,
            details: None,
            aliases: Vec::new(),
            severity: Vec::new(),
            secondary_score: None,
            severity_label: None,
            references: Vec::new(),
            affected: Vec::new(),
            raw: Value::Null,
        }
    }

    /// First CVE identifier among the id and its aliases
    pub fn cve_id(&self) -> Option<&str> {
        std::iter::once(self.id.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .find(|id| id.starts_with("CVE-"))
    }

    /// First fixed version published for `package_name`, falling back to any fixed version
    pub fn fixed_version_for(&self, package_name: &str) -> Option<&str> {
        let matching = self
            .affected
            .iter()
            .filter(|a| a.name.as_deref() == Some(package_name))
            .find_map(|a| a.fixed_versions.first());

        matching
            .or_else(|| self.affected.iter().find_map(|a| a.fixed_versions.first()))
            .map(String::as_str)
    }

    /// Best human title: summary, else first line of details, else the id
    pub fn title(&self) -> String {
        if let Some(summary) = self.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            return summary.trim().to_string();
        }
        self.details
            .as_deref()
            .and_then(|d| d.lines().find(|l| !l.trim().is_empty()))
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// A raw advisory paired with the query it was reported for
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyMatch {
    pub query: PackageQuery,
    pub record: RawVulnerabilityRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cve_id_from_aliases() {
        let mut record = RawVulnerabilityRecord::new("GHSA-xxxx-yyyy-zzzz");
        record.aliases = vec!["PYSEC-2020-1".to_string(), "CVE-2020-1234".to_string()];
        assert_eq!(record.cve_id(), Some("CVE-2020-1234"));
    }

    #[test]
    fn test_cve_id_is_own_id() {
        let record = RawVulnerabilityRecord::new("CVE-2021-0001");
        assert_eq!(record.cve_id(), Some("CVE-2021-0001"));
    }

    #[test]
    fn test_cve_id_absent() {
        let record = RawVulnerabilityRecord::new("GHSA-aaaa");
        assert_eq!(record.cve_id(), None);
    }

    #[test]
    fn test_fixed_version_prefers_matching_package() {
        let mut record = RawVulnerabilityRecord::new("GHSA-1");
        record.affected = vec![
            AffectedPackage {
                name: Some("other".to_string()),
                ecosystem: None,
                fixed_versions: vec!["9.9.9".to_string()],
            },
            AffectedPackage {
                name: Some("lodash".to_string()),
                ecosystem: Some("npm".to_string()),
                fixed_versions: vec!["4.17.21".to_string()],
            },
        ];
        assert_eq!(record.fixed_version_for("lodash"), Some("4.17.21"));
        assert_eq!(record.fixed_version_for("unknown"), Some("9.9.9"));
    }

    #[test]
    fn test_title_fallbacks() {
        let mut record = RawVulnerabilityRecord::new("GHSA-1");
        assert_eq!(record.title(), "GHSA-1");

        record.details = Some("\nFirst line\nSecond".to_string());
        assert_eq!(record.title(), "First line");

        record.summary = Some("Prototype pollution".to_string());
        assert_eq!(record.title(), "Prototype pollution");
    }
}
