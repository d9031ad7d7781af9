use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for package names (security limit)
const MAX_PACKAGE_NAME_LENGTH: usize = 255;

/// Maximum length for package versions (security limit)
const MAX_VERSION_LENGTH: usize = 100;

/// Wildcard used in place of a version for unpinned dedup keys
pub const UNPINNED_WILDCARD: &str = "*";

/// Package-management namespace a query belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ecosystem {
    #[serde(rename = "npm")]
    Npm,
    #[serde(rename = "PyPI")]
    PyPI,
    #[serde(rename = "Go")]
    Go,
    #[serde(rename = "crates.io")]
    CratesIo,
    #[serde(rename = "Packagist")]
    Packagist,
}

impl Ecosystem {
    /// Identifier understood by the vulnerability database
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::PyPI => "PyPI",
            Ecosystem::Go => "Go",
            Ecosystem::CratesIo => "crates.io",
            Ecosystem::Packagist => "Packagist",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single `(name, ecosystem, version?)` lookup produced by a parser.
///
/// `version == None` means the manifest did not pin the package; such
/// queries survive deduplication but are never sent to the database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageQuery {
    name: String,
    ecosystem: Ecosystem,
    version: Option<String>,
}

impl PackageQuery {
    pub fn new(name: String, ecosystem: Ecosystem, version: Option<String>) -> Result<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            anyhow::bail!("Package name cannot be empty");
        }

        // Security: Length limit to prevent DoS
        if name.len() > MAX_PACKAGE_NAME_LENGTH {
            anyhow::bail!(
                "Package name is too long ({} bytes). Maximum allowed: {} bytes",
                name.len(),
                MAX_PACKAGE_NAME_LENGTH
            );
        }

        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            anyhow::bail!("Package name '{}' contains whitespace or control characters", name);
        }

        let version = match version.map(|v| v.trim().to_string()) {
            Some(v) if v.is_empty() => None,
            Some(v) => {
                if v.len() > MAX_VERSION_LENGTH {
                    anyhow::bail!(
                        "Package version is too long ({} bytes). Maximum allowed: {} bytes",
                        v.len(),
                        MAX_VERSION_LENGTH
                    );
                }
                if v.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    anyhow::bail!("Package version '{}' contains whitespace", v);
                }
                Some(v)
            }
            None => None,
        };

        Ok(Self {
            name,
            ecosystem,
            version,
        })
    }

    pub fn pinned(name: &str, ecosystem: Ecosystem, version: &str) -> Result<Self> {
        Self::new(name.to_string(), ecosystem, Some(version.to_string()))
    }

    pub fn unpinned(name: &str, ecosystem: Ecosystem) -> Result<Self> {
        Self::new(name.to_string(), ecosystem, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_pinned(&self) -> bool {
        self.version.is_some()
    }

    /// Uniqueness key `(ecosystem, name, version-or-wildcard)`
    pub fn dedup_key(&self) -> (Ecosystem, String, String) {
        (
            self.ecosystem,
            self.name.clone(),
            self.version
                .clone()
                .unwrap_or_else(|| UNPINNED_WILDCARD.to_string()),
        )
    }
}

impl fmt::Display for PackageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}@{}", self.ecosystem, self.name, v),
            None => write!(f, "{}:{}", self.ecosystem, self.name),
        }
    }
}
