//! PyPI: `requirements.txt`, `Pipfile.lock`, `poetry.lock`

use super::{exact_version, QueryList};
use crate::scanning::domain::{Ecosystem, PackageQuery};
use crate::shared::Result;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Parses `requirements.txt`.
///
/// `name==version` is pinned; any other requirement is kept unpinned.
/// Comments, blank lines and pip options (`-r`, `-e`, `--index-url`) are ignored.
pub fn parse_requirements(content: &str) -> Result<Vec<PackageQuery>> {
    let mut queries = QueryList::default();

    for raw_line in content.lines() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() || line.starts_with('-') {
            continue;
        }
        // Environment markers: `pkg==1.0 ; python_version < "3.8"`
        let requirement = line.split(';').next().unwrap_or(line).trim();

        let query = match requirement.split_once("==") {
            Some((name, version)) => {
                let version = version
                    .trim_start_matches('=')
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .next()
                    .unwrap_or_default();
                let name = strip_extras(name);
                match exact_version(version) {
                    Some(version) => PackageQuery::pinned(name, Ecosystem::PyPI, &version),
                    None => PackageQuery::unpinned(name, Ecosystem::PyPI),
                }
            }
            None => {
                let end = requirement
                    .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | '@' | '(' | ' '))
                    .unwrap_or(requirement.len());
                PackageQuery::unpinned(strip_extras(&requirement[..end]), Ecosystem::PyPI)
            }
        };

        match query {
            Ok(query) if is_distribution_name(query.name()) => queries.push(query),
            _ => tracing::debug!(line = %line, "Skipping unrecognized requirement"),
        }
    }

    Ok(queries.into_vec())
}

/// `#` starts a comment only at line start or after whitespace (URLs may contain `#egg=`)
fn strip_inline_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// `requests[security]` -> `requests`
fn strip_extras(name: &str) -> &str {
    name.split('[').next().unwrap_or(name).trim()
}

fn is_distribution_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[derive(Debug, Deserialize)]
struct PipfileLock {
    #[serde(default)]
    default: BTreeMap<String, PipfileEntry>,
    #[serde(default)]
    develop: BTreeMap<String, PipfileEntry>,
}

#[derive(Debug, Deserialize)]
struct PipfileEntry {
    #[serde(default)]
    version: Option<String>,
}

/// Parses `Pipfile.lock` (`default` then `develop` sections)
pub fn parse_pipfile_lock(content: &str) -> Result<Vec<PackageQuery>> {
    let lock: PipfileLock =
        serde_json::from_str(content).context("Pipfile.lock is not valid JSON")?;
    let mut queries = QueryList::default();

    for (name, entry) in lock.default.iter().chain(lock.develop.iter()) {
        // VCS and path entries carry no version
        let Some(version) = entry
            .version
            .as_deref()
            .map(|v| v.trim_start_matches("=="))
            .and_then(exact_version)
        else {
            continue;
        };
        if let Ok(query) = PackageQuery::pinned(name, Ecosystem::PyPI, &version) {
            queries.push(query);
        }
    }

    Ok(queries.into_vec())
}

#[derive(Debug, Deserialize)]
struct PoetryLock {
    #[serde(default)]
    package: Vec<PoetryPackage>,
}

#[derive(Debug, Deserialize)]
struct PoetryPackage {
    name: String,
    version: String,
}

/// Parses `poetry.lock` `[[package]]` tables
pub fn parse_poetry_lock(content: &str) -> Result<Vec<PackageQuery>> {
    let lock: PoetryLock = toml::from_str(content).context("Failed to parse poetry.lock file")?;
    let mut queries = QueryList::default();

    for package in lock.package {
        if let Some(version) = exact_version(&package.version) {
            if let Ok(query) = PackageQuery::pinned(&package.name, Ecosystem::PyPI, &version) {
                queries.push(query);
            }
        }
    }

    Ok(queries.into_vec())
}
