use super::settings::ScanSettings;
use crate::ports::outbound::SourceHost;
use crate::scanning::domain::RepositoryRef;
use crate::scanning::parsers::ManifestKind;
use crate::shared::error::ScanError;
use futures::stream::{self, StreamExt};

const SERVICE: &str = "source-host";

/// One manifest file retrieved from the source host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedManifest {
    pub kind: ManifestKind,
    pub path: String,
    pub content: String,
}

/// What the fetcher could retrieve, plus the failure that prevented the rest
#[derive(Debug, Default)]
pub struct ManifestFetchOutcome {
    /// Found files, in candidate order
    pub manifests: Vec<FetchedManifest>,
    /// Paths whose retrieval failed (missing files are not failures)
    pub failed_paths: Vec<String>,
    /// Set when every attempted path failed, i.e. the host is unreachable
    pub error: Option<anyhow::Error>,
}

/// FetchManifestsUseCase - retrieves candidate dependency files for a repository
///
/// Probes [`ManifestKind::CANDIDATES`] at the repository root. A missing file
/// is skipped silently; a failing path does not stop the other probes.
/// Request deadlines belong to the host handed in (see `ThrottledSourceHost`).
pub struct FetchManifestsUseCase<'a, H> {
    source_host: &'a H,
    settings: ScanSettings,
}

impl<'a, H: SourceHost> FetchManifestsUseCase<'a, H> {
    pub fn new(source_host: &'a H, settings: ScanSettings) -> Self {
        Self {
            source_host,
            settings,
        }
    }

    pub async fn execute(&self, repository: &RepositoryRef) -> ManifestFetchOutcome {
        let attempts: Vec<_> = stream::iter(ManifestKind::CANDIDATES)
            .map(|kind| async move {
                let path = kind.file_name();
                let result = self.source_host.fetch_file(repository, path).await;
                (kind, result)
            })
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let mut outcome = ManifestFetchOutcome::default();
        let mut last_error = None;
        let attempted = attempts.len();

        for (kind, result) in attempts {
            match result {
                Ok(Some(content)) => outcome.manifests.push(FetchedManifest {
                    kind,
                    path: kind.file_name().to_string(),
                    content,
                }),
                Ok(None) => {
                    tracing::debug!(path = kind.file_name(), "Manifest not present");
                }
                Err(e) => {
                    tracing::warn!(path = kind.file_name(), error = %e, "Failed to fetch manifest");
                    outcome.failed_paths.push(kind.file_name().to_string());
                    last_error = Some(e);
                }
            }
        }

        if attempted > 0 && outcome.failed_paths.len() == attempted {
            let details = last_error
                .map(|e| format!("{:#}", e))
                .unwrap_or_else(|| "no manifest could be retrieved".to_string());
            outcome.error = Some(ScanError::upstream(SERVICE, details).into());
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::TreeEntry;
    use crate::shared::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StubHost {
        files: HashMap<&'static str, &'static str>,
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl SourceHost for StubHost {
        async fn fetch_file(&self, _repo: &RepositoryRef, path: &str) -> Result<Option<String>> {
            if self.failing.contains(&path) || self.failing.contains(&"*") {
                anyhow::bail!("connection reset");
            }
            Ok(self.files.get(path).map(|c| c.to_string()))
        }

        async fn fetch_tree(&self, _repo: &RepositoryRef) -> Result<Vec<TreeEntry>> {
            Ok(vec![])
        }
    }

    fn repo() -> RepositoryRef {
        RepositoryRef::parse("https://github.com/octo/demo", None).unwrap()
    }

    #[tokio::test]
    async fn test_missing_files_skipped_in_candidate_order() {
        let host = StubHost {
            files: HashMap::from([("go.mod", "module x"), ("package-lock.json", "{}")]),
            failing: vec![],
        };
        let outcome = FetchManifestsUseCase::new(&host, ScanSettings::default())
            .execute(&repo())
            .await;
        let paths: Vec<_> = outcome.manifests.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["package-lock.json", "go.mod"]);
        assert!(outcome.error.is_none());
        assert!(outcome.failed_paths.is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_path_does_not_abort() {
        let host = StubHost {
            files: HashMap::from([("requirements.txt", "flask==1.0.0")]),
            failing: vec!["package-lock.json"],
        };
        let outcome = FetchManifestsUseCase::new(&host, ScanSettings::default())
            .execute(&repo())
            .await;
        assert_eq!(outcome.manifests.len(), 1);
        assert_eq!(outcome.failed_paths, vec!["package-lock.json"]);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_error() {
        let host = StubHost {
            files: HashMap::new(),
            failing: vec!["*"],
        };
        let outcome = FetchManifestsUseCase::new(&host, ScanSettings::default())
            .execute(&repo())
            .await;
        assert!(outcome.manifests.is_empty());
        let err = outcome.error.unwrap();
        assert!(matches!(
            err.downcast_ref::<ScanError>(),
            Some(ScanError::UpstreamService { .. })
        ));
    }
}
