use crate::ports::outbound::{SourceHost, TreeEntry, TreeEntryKind};
use crate::scanning::domain::RepositoryRef;
use crate::shared::error::ScanError;
use crate::shared::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const SERVICE: &str = "github";

/// GitHubSourceHost adapter reading repositories through the GitHub REST API
///
/// File content comes from the contents API in raw form, tree listings from
/// the git trees API. A bearer token, when configured, is sent on every
/// request and unlocks private repositories and higher rate limits.
///
/// Only repositories on `github.com`, or on the host the API URL points at
/// (GitHub Enterprise), are served. Anything else is rejected before a request
/// goes out.
pub struct GitHubSourceHost {
    client: Client,
    api_url: String,
    hosts: Vec<String>,
}

impl GitHubSourceHost {
    pub const DEFAULT_API_URL: &'static str = "https://api.github.com";
    const PUBLIC_HOST: &'static str = "github.com";
    const RAW_MEDIA_TYPE: &'static str = "application/vnd.github.raw+json";

    pub fn new(api_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| ScanError::Config {
                message: "GitHub token contains characters that are not valid in an HTTP header".to_string(),
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("reposcan/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            hosts: Self::served_hosts(api_url),
        })
    }

    /// `github.com` plus the web host behind `api_url` (`api.` prefix dropped)
    fn served_hosts(api_url: &str) -> Vec<String> {
        let mut hosts = vec![Self::PUBLIC_HOST.to_string()];
        let api_host = reqwest::Url::parse(api_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_lowercase));
        if let Some(api_host) = api_host {
            let web_host = api_host
                .strip_prefix("api.")
                .map(str::to_string)
                .unwrap_or(api_host);
            if !hosts.contains(&web_host) {
                hosts.push(web_host);
            }
        }
        hosts
    }

    /// Rejects paths that could escape the repository or alter the URL
    fn validate_path(path: &str) -> Result<()> {
        if path.is_empty() || path.starts_with('/') || path.contains('\\') {
            return Err(ScanError::invalid_input(
                format!("Invalid repository path: '{}'", path),
                "Use a relative path inside the repository",
            )
            .into());
        }
        if path.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(ScanError::invalid_input(
                format!("Invalid repository path: '{}'", path),
                "Paths must not contain empty or '..' segments",
            )
            .into());
        }
        Ok(())
    }

    fn encode_path(path: &str) -> String {
        path.split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn repo_url(&self, repo: &RepositoryRef) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_url,
            urlencoding::encode(repo.owner()),
            urlencoding::encode(repo.name())
        )
    }

    fn status_error(status: StatusCode, what: &str) -> anyhow::Error {
        let details = match status {
            StatusCode::UNAUTHORIZED => format!("{}: HTTP {} (check the access token)", what, status),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                format!("{}: HTTP {} (rate limited or access denied)", what, status)
            }
            _ => format!("{}: HTTP {}", what, status),
        };
        ScanError::upstream(SERVICE, details).into()
    }
}

#[async_trait]
impl SourceHost for GitHubSourceHost {
    fn ensure_supported(&self, repo: &RepositoryRef) -> Result<()> {
        if self.hosts.iter().any(|host| host == repo.host()) {
            return Ok(());
        }
        Err(ScanError::invalid_input(
            format!("Repository host '{}' is not served by this GitHub source", repo.host()),
            format!("Supported hosts: {}", self.hosts.join(", ")),
        )
        .into())
    }

    async fn fetch_file(&self, repo: &RepositoryRef, path: &str) -> Result<Option<String>> {
        self.ensure_supported(repo)?;
        Self::validate_path(path)?;
        let url = format!(
            "{}/contents/{}?ref={}",
            self.repo_url(repo),
            Self::encode_path(path),
            urlencoding::encode(repo.branch())
        );

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, Self::RAW_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| ScanError::upstream(SERVICE, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(repository = %repo.full_name(), path = %path, "File not found");
                Ok(None)
            }
            status if status.is_success() => {
                let content = response
                    .text()
                    .await
                    .map_err(|e| ScanError::upstream(SERVICE, e))?;
                Ok(Some(content))
            }
            status => Err(Self::status_error(status, &format!("fetching {}", path))),
        }
    }

    async fn fetch_tree(&self, repo: &RepositoryRef) -> Result<Vec<TreeEntry>> {
        self.ensure_supported(repo)?;
        let url = format!(
            "{}/git/trees/{}?recursive=1",
            self.repo_url(repo),
            urlencoding::encode(repo.branch())
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScanError::upstream(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, "listing repository tree"));
        }

        let listing: GitTreeResponse = response
            .json()
            .await
            .map_err(|e| ScanError::upstream(SERVICE, format!("invalid tree response: {}", e)))?;
        if listing.truncated {
            tracing::warn!(
                repository = %repo.full_name(),
                entries = listing.tree.len(),
                "Tree listing truncated by GitHub, some files are not scanned"
            );
        }

        Ok(listing
            .tree
            .into_iter()
            .filter_map(|entry| {
                let kind = match entry.entry_type.as_str() {
                    "blob" => TreeEntryKind::File,
                    "tree" => TreeEntryKind::Directory,
                    // Submodules ("commit") live in other repositories
                    _ => return None,
                };
                Some(TreeEntry {
                    path: entry.path,
                    kind,
                    size: entry.size,
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct GitTreeResponse {
    #[serde(default)]
    tree: Vec<GitTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct GitTreeEntry {
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default)]
    size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let host = GitHubSourceHost::new("https://api.github.com/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(host.api_url, "https://api.github.com");
        assert!(GitHubSourceHost::new(GitHubSourceHost::DEFAULT_API_URL, Some("ghp_abc"), Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_served_hosts() {
        assert_eq!(GitHubSourceHost::served_hosts("https://api.github.com"), vec!["github.com"]);
        assert_eq!(
            GitHubSourceHost::served_hosts("https://ghe.example.com/api/v3"),
            vec!["github.com", "ghe.example.com"]
        );
        assert_eq!(
            GitHubSourceHost::served_hosts("https://api.ghe.example.com"),
            vec!["github.com", "ghe.example.com"]
        );
    }

    #[test]
    fn test_foreign_host_rejected() {
        let host = GitHubSourceHost::new(GitHubSourceHost::DEFAULT_API_URL, None, Duration::from_secs(5)).unwrap();
        let gitlab = RepositoryRef::parse("https://gitlab.com/octo/demo", None).unwrap();
        let err = host.ensure_supported(&gitlab).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScanError>(),
            Some(ScanError::InvalidInput { .. })
        ));
        let github = RepositoryRef::parse("https://github.com/octo/demo", None).unwrap();
        assert!(host.ensure_supported(&github).is_ok());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = GitHubSourceHost::new("https://api.github.com", Some("bad\ntoken"), Duration::from_secs(5));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(GitHubSourceHost::validate_path("package.json").is_ok());
        assert!(GitHubSourceHost::validate_path("config/production.json").is_ok());
        assert!(GitHubSourceHost::validate_path("../secrets").is_err());
        assert!(GitHubSourceHost::validate_path("/etc/passwd").is_err());
        assert!(GitHubSourceHost::validate_path("a//b").is_err());
        assert!(GitHubSourceHost::validate_path("").is_err());
    }

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(
            GitHubSourceHost::encode_path("web/my file#1.js"),
            "web/my%20file%231.js"
        );
    }

    #[test]
    fn test_status_error_is_upstream() {
        let err = GitHubSourceHost::status_error(StatusCode::FORBIDDEN, "fetching x");
        match err.downcast_ref::<ScanError>() {
            Some(ScanError::UpstreamService { service, details }) => {
                assert_eq!(service, "github");
                assert!(details.contains("rate limited"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
