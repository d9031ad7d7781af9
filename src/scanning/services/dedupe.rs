use crate::scanning::domain::Vulnerability;
use std::collections::HashSet;

/// Drops repeated reports of the same CVE against the same component.
///
/// Key is `(affected_component, cve_id)`; entries lacking either part are
/// always kept. The first occurrence wins and relative order is preserved.
pub fn dedupe_vulnerabilities(vulnerabilities: Vec<Vulnerability>) -> Vec<Vulnerability> {
    let mut seen = HashSet::new();
    vulnerabilities
        .into_iter()
        .filter(|v| match (v.affected_component(), v.cve_id()) {
            (Some(component), Some(cve)) => seen.insert((component.to_string(), cve.to_string())),
            _ => true,
        })
        .collect()
}
