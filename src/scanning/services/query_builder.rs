use crate::scanning::domain::{Ecosystem, PackageQuery};
use crate::scanning::parsers::ManifestKind;
use std::collections::HashSet;

/// Records parsed from one manifest file
#[derive(Debug, Clone)]
pub struct ParsedManifest {
    pub kind: ManifestKind,
    pub path: String,
    pub queries: Vec<PackageQuery>,
}

/// Merges parsed manifests into one deduplicated, ordered query batch.
///
/// Lockfiles are consumed before manifests. A manifest-declared package is
/// dropped when any lockfile already pinned a version for the same
/// `(ecosystem, name)`. Remaining duplicates collapse on
/// `(ecosystem, name, version-or-wildcard)`, first write wins.
pub fn build_queries(manifests: &[ParsedManifest]) -> Vec<PackageQuery> {
    let mut seen_keys = HashSet::new();
    let mut locked_names: HashSet<(Ecosystem, String)> = HashSet::new();
    let mut batch = Vec::new();

    let (lockfiles, declared): (Vec<&ParsedManifest>, Vec<&ParsedManifest>) =
        manifests.iter().partition(|m| m.kind.is_lockfile());

    for manifest in lockfiles {
        for query in &manifest.queries {
            locked_names.insert((query.ecosystem(), query.name().to_string()));
            if seen_keys.insert(query.dedup_key()) {
                batch.push(query.clone());
            }
        }
    }

    for manifest in declared {
        for query in &manifest.queries {
            if locked_names.contains(&(query.ecosystem(), query.name().to_string())) {
                continue;
            }
            if seen_keys.insert(query.dedup_key()) {
                batch.push(query.clone());
            }
        }
    }

    batch
}
