use crate::shared::error::ScanError;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Branch used when neither the request nor the URL names one
pub const DEFAULT_BRANCH: &str = "main";

const URL_HINT: &str = "Use the form https://<host>/<owner>/<repo> or https://<host>/<owner>/<repo>/tree/<branch>";

/// Identity of the repository/branch a scan targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    host: String,
    owner: String,
    name: String,
    branch: String,
}

impl RepositoryRef {
    pub fn new(host: &str, owner: &str, name: &str, branch: &str) -> Result<Self> {
        for (label, value) in [("owner", owner), ("repository", name)] {
            if !is_valid_segment(value) {
                return Err(ScanError::invalid_input(
                    format!("Invalid {} name '{}'", label, value),
                    URL_HINT,
                )
                .into());
            }
        }
        if branch.trim().is_empty() || branch.contains("..") || branch.chars().any(char::is_whitespace) {
            return Err(
                ScanError::invalid_input(format!("Invalid branch name '{}'", branch), URL_HINT).into(),
            );
        }

        Ok(Self {
            host: host.to_lowercase(),
            owner: owner.to_string(),
            name: name.to_string(),
            branch: branch.to_string(),
        })
    }

    /// Parses `https://<host>/<owner>/<repo>[/tree/<branch>]`.
    ///
    /// An explicit `branch` wins over the one embedded in the URL, which in
    /// turn wins over [`DEFAULT_BRANCH`].
    pub fn parse(repo_url: &str, branch: Option<&str>) -> Result<Self> {
        let trimmed = repo_url.trim();
        let Some(rest) = trimmed.strip_prefix("https://") else {
            return Err(ScanError::invalid_input(
                format!("Repository URL must start with https://: '{}'", trimmed),
                URL_HINT,
            )
            .into());
        };

        let rest = rest.trim_end_matches('/');
        let mut segments = rest.split('/');
        let host = segments.next().unwrap_or_default();
        let owner = segments.next().unwrap_or_default();
        let repo = segments
            .next()
            .unwrap_or_default()
            .trim_end_matches(".git");

        if host.is_empty() || !host.contains('.') || owner.is_empty() || repo.is_empty() {
            return Err(ScanError::invalid_input(
                format!("Unable to parse repository URL '{}'", trimmed),
                URL_HINT,
            )
            .into());
        }

        let url_branch = match segments.next() {
            None => None,
            Some("tree") => {
                let branch: Vec<&str> = segments.collect();
                if branch.is_empty() {
                    return Err(ScanError::invalid_input(
                        format!("Missing branch after /tree/ in '{}'", trimmed),
                        URL_HINT,
                    )
                    .into());
                }
                Some(branch.join("/"))
            }
            Some(other) => {
                return Err(ScanError::invalid_input(
                    format!("Unexpected path segment '{}' in '{}'", other, trimmed),
                    URL_HINT,
                )
                .into());
            }
        };

        let branch = branch
            .map(str::to_string)
            .filter(|b| !b.trim().is_empty())
            .or(url_branch)
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        Self::new(host, owner, repo, &branch)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.name, self.branch)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Which detection branches a scan runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    /// Dependencies, static patterns and configuration audit
    #[default]
    Full,
    /// Dependency lookup only
    Dependencies,
    /// Dependencies and configuration audit, CRITICAL findings only
    Quick,
}

impl ScanType {
    pub fn runs_dependencies(&self) -> bool {
        true
    }

    pub fn runs_static_analysis(&self) -> bool {
        matches!(self, ScanType::Full)
    }

    pub fn runs_config_audit(&self) -> bool {
        matches!(self, ScanType::Full | ScanType::Quick)
    }

    pub fn critical_only(&self) -> bool {
        matches!(self, ScanType::Quick)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Full => "full",
            ScanType::Dependencies => "dependencies",
            ScanType::Quick => "quick",
        }
    }
}

impl FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(ScanType::Full),
            "dependencies" | "deps" => Ok(ScanType::Dependencies),
            "quick" => Ok(ScanType::Quick),
            _ => Err(format!(
                "Invalid scan type: {}. Please specify 'full', 'dependencies' or 'quick'",
                s
            )),
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
