//! Packagist: `composer.lock`

use super::{exact_version, QueryList};
use crate::scanning::domain::{Ecosystem, PackageQuery};
use crate::shared::Result;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ComposerLock {
    #[serde(default)]
    packages: Vec<ComposerPackage>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Vec<ComposerPackage>,
}

#[derive(Debug, Deserialize)]
struct ComposerPackage {
    name: String,
    version: String,
}

/// Parses `composer.lock` (`packages` then `packages-dev`).
///
/// Branch aliases such as `dev-main` name no release and are skipped.
pub fn parse_composer_lock(content: &str) -> Result<Vec<PackageQuery>> {
    let lock: ComposerLock =
        serde_json::from_str(content).context("composer.lock is not valid JSON")?;
    let mut queries = QueryList::default();

    for package in lock.packages.iter().chain(lock.packages_dev.iter()) {
        if package.version.starts_with("dev-") {
            continue;
        }
        if let Some(version) = exact_version(&package.version) {
            if let Ok(query) = PackageQuery::pinned(&package.name, Ecosystem::Packagist, &version) {
                queries.push(query);
            }
        }
    }

    Ok(queries.into_vec())
}
