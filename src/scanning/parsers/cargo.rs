//! crates.io: `Cargo.lock`

use super::{exact_version, QueryList};
use crate::scanning::domain::{Ecosystem, PackageQuery};
use crate::shared::Result;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<CargoPackage>,
}

#[derive(Debug, Deserialize)]
struct CargoPackage {
    name: String,
    version: String,
    #[serde(default)]
    source: Option<String>,
}

/// Parses `Cargo.lock` `[[package]]` tables.
///
/// Workspace members have no `source` and are not looked up.
pub fn parse_cargo_lock(content: &str) -> Result<Vec<PackageQuery>> {
    let lock: CargoLock = toml::from_str(content).context("Failed to parse Cargo.lock file")?;
    let mut queries = QueryList::default();

    for package in lock.package {
        if package.source.is_none() {
            continue;
        }
        if let Some(version) = exact_version(&package.version) {
            if let Ok(query) = PackageQuery::pinned(&package.name, Ecosystem::CratesIo, &version) {
                queries.push(query);
            }
        }
    }

    Ok(queries.into_vec())
}
