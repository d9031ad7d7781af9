//! Ecosystem parsers: manifest text in, `PackageQuery` records out.
//!
//! Every parser is a pure function of the file content. Malformed content is
//! reported as [`ScanError::Parse`] so the caller can log it and move on with
//! zero records for that file.

pub mod cargo;
pub mod composer;
pub mod go;
pub mod npm;
pub mod python;

use crate::scanning::domain::{Ecosystem, PackageQuery};
use crate::shared::error::ScanError;
use crate::shared::Result;
use std::collections::HashSet;
use std::fmt;

/// Dependency files the engine knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    PackageLock,
    YarnLock,
    PnpmLock,
    PipfileLock,
    PoetryLock,
    CargoLock,
    ComposerLock,
    PackageJson,
    Requirements,
    GoMod,
}

impl ManifestKind {
    /// Candidate files in fetch and precedence order: lockfiles, then manifests
    pub const CANDIDATES: [ManifestKind; 10] = [
        ManifestKind::PackageLock,
        ManifestKind::YarnLock,
        ManifestKind::PnpmLock,
        ManifestKind::PipfileLock,
        ManifestKind::PoetryLock,
        ManifestKind::CargoLock,
        ManifestKind::ComposerLock,
        ManifestKind::PackageJson,
        ManifestKind::Requirements,
        ManifestKind::GoMod,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestKind::PackageLock => "package-lock.json",
            ManifestKind::YarnLock => "yarn.lock",
            ManifestKind::PnpmLock => "pnpm-lock.yaml",
            ManifestKind::PipfileLock => "Pipfile.lock",
            ManifestKind::PoetryLock => "poetry.lock",
            ManifestKind::CargoLock => "Cargo.lock",
            ManifestKind::ComposerLock => "composer.lock",
            ManifestKind::PackageJson => "package.json",
            ManifestKind::Requirements => "requirements.txt",
            ManifestKind::GoMod => "go.mod",
        }
    }

    /// Matches on the final path component, so `web/package.json` is a `PackageJson`
    pub fn from_path(path: &str) -> Option<Self> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        Self::CANDIDATES
            .into_iter()
            .find(|kind| kind.file_name() == file_name)
    }

    /// Lockfiles pin exact resolved versions
    pub fn is_lockfile(&self) -> bool {
        !matches!(
            self,
            ManifestKind::PackageJson | ManifestKind::Requirements | ManifestKind::GoMod
        )
    }

    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            ManifestKind::PackageLock
            | ManifestKind::YarnLock
            | ManifestKind::PnpmLock
            | ManifestKind::PackageJson => Ecosystem::Npm,
            ManifestKind::PipfileLock | ManifestKind::PoetryLock | ManifestKind::Requirements => {
                Ecosystem::PyPI
            }
            ManifestKind::CargoLock => Ecosystem::CratesIo,
            ManifestKind::ComposerLock => Ecosystem::Packagist,
            ManifestKind::GoMod => Ecosystem::Go,
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Parses one manifest into package queries.
///
/// Failures are wrapped in [`ScanError::Parse`] carrying `path`.
pub fn parse_manifest(kind: ManifestKind, path: &str, content: &str) -> Result<Vec<PackageQuery>> {
    let parsed = match kind {
        ManifestKind::PackageLock => npm::parse_package_lock(content),
        ManifestKind::YarnLock => npm::parse_yarn_lock(content),
        ManifestKind::PnpmLock => npm::parse_pnpm_lock(content),
        ManifestKind::PackageJson => npm::parse_package_json(content),
        ManifestKind::PipfileLock => python::parse_pipfile_lock(content),
        ManifestKind::PoetryLock => python::parse_poetry_lock(content),
        ManifestKind::Requirements => python::parse_requirements(content),
        ManifestKind::CargoLock => cargo::parse_cargo_lock(content),
        ManifestKind::ComposerLock => composer::parse_composer_lock(content),
        ManifestKind::GoMod => go::parse_go_mod(content),
    };

    parsed.map_err(|e| {
        ScanError::Parse {
            path: path.to_string(),
            details: format!("{:#}", e),
        }
        .into()
    })
}

/// Returns the version if it names one exact release (`1.2.3`, `v1.9.1`, `2.0rc1`).
///
/// Ranges, wildcards, URLs and git refs yield `None`. A leading `v` is dropped.
pub(crate) fn exact_version(raw: &str) -> Option<String> {
    let v = raw.trim();
    let v = v.strip_prefix('v').unwrap_or(v);
    let starts_with_digit = v.chars().next().is_some_and(|c| c.is_ascii_digit());
    let plain = v
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'));
    let wildcard = v
        .split('.')
        .any(|part| part.eq_ignore_ascii_case("x") || part == "*");
    (starts_with_digit && plain && !wildcard).then(|| v.to_string())
}

/// Package queries in first-seen order, without repeats
#[derive(Debug, Default)]
pub(crate) struct QueryList {
    queries: Vec<PackageQuery>,
    seen: HashSet<PackageQuery>,
}

impl QueryList {
    /// Appends `query` unless an identical one was already pushed
    pub(crate) fn push(&mut self, query: PackageQuery) {
        if self.seen.insert(query.clone()) {
            self.queries.push(query);
        }
    }

    pub(crate) fn into_vec(self) -> Vec<PackageQuery> {
        self.queries
    }
}
