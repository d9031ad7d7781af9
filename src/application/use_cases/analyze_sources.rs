use super::settings::ScanSettings;
use crate::ports::outbound::{SourceHost, TreeEntry};
use crate::scanning::domain::{
    detection_source, CodeFinding, ConfigFinding, RepositoryRef, ScanType,
};
use crate::scanning::rules::ConfigTarget;
use crate::scanning::services::{audit_file, is_scannable, scan_file};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};

/// Output of the static-analysis and configuration branches
#[derive(Debug, Default)]
pub struct SourceAnalysisOutcome {
    pub code: Vec<CodeFinding>,
    pub config: Vec<ConfigFinding>,
    /// Number of source files handed to the pattern scanner
    pub files_scanned: usize,
    pub degraded: Vec<String>,
}

/// Contents retrieved for the selected paths, plus the paths that failed
#[derive(Debug, Default)]
struct FetchedFiles {
    contents: HashMap<String, String>,
    failed: HashSet<String>,
}

impl FetchedFiles {
    fn content(&self, path: &str) -> Option<&str> {
        self.contents.get(path).map(String::as_str)
    }

    fn any_failed(&self, paths: &[String]) -> bool {
        paths.iter().any(|path| self.failed.contains(path))
    }
}

/// Paths selected for each branch
#[derive(Debug, Default, PartialEq)]
struct Candidates {
    code: Vec<String>,
    config: Vec<String>,
}

impl Candidates {
    /// Every selected path once, code candidates first
    fn unique_paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.code
            .iter()
            .chain(&self.config)
            .filter(|path| seen.insert(path.as_str()))
            .cloned()
            .collect()
    }
}

/// AnalyzeSourcesUseCase - pattern scanning and configuration auditing
///
/// `full` scans walk the repository tree; `quick` scans only probe
/// well-known configuration paths. A path selected by both branches (a
/// `docker-compose.yml`, say) is fetched once and handed to both detectors.
pub struct AnalyzeSourcesUseCase<'a, H> {
    source_host: &'a H,
    settings: ScanSettings,
}

impl<'a, H: SourceHost> AnalyzeSourcesUseCase<'a, H> {
    pub fn new(source_host: &'a H, settings: ScanSettings) -> Self {
        Self {
            source_host,
            settings,
        }
    }

    pub async fn execute(&self, repository: &RepositoryRef, scan_type: ScanType) -> SourceAnalysisOutcome {
        let mut outcome = SourceAnalysisOutcome::default();
        if !scan_type.runs_static_analysis() && !scan_type.runs_config_audit() {
            return outcome;
        }

        // Step 1: Select candidate files
        let candidates = if scan_type.runs_static_analysis() {
            match self.source_host.fetch_tree(repository).await {
                Ok(tree) => self.select_candidates(&tree),
                Err(e) => {
                    tracing::warn!(
                        repository = %repository.full_name(),
                        error = %e,
                        "Repository tree unavailable, auditing well-known config paths only"
                    );
                    outcome.degraded.push(detection_source::SOURCE_TREE.to_string());
                    Candidates {
                        code: Vec::new(),
                        config: well_known_config_paths(),
                    }
                }
            }
        } else {
            Candidates {
                code: Vec::new(),
                config: well_known_config_paths(),
            }
        };

        tracing::debug!(
            code_files = candidates.code.len(),
            config_files = candidates.config.len(),
            "Selected files for source analysis"
        );

        // Step 2: Fetch every selected path once
        let fetched = self.fetch_all(repository, candidates.unique_paths()).await;

        // Step 3: Run the pure detectors over what was retrieved
        let limits = self.settings.pattern_limits;
        for path in &candidates.code {
            if let Some(content) = fetched.content(path) {
                outcome.files_scanned += 1;
                outcome.code.extend(scan_file(path, content, limits));
            }
        }
        if scan_type.runs_config_audit() {
            outcome.config = candidates
                .config
                .iter()
                .filter_map(|path| fetched.content(path).map(|content| audit_file(path, content)))
                .flatten()
                .collect();
        }

        if fetched.any_failed(&candidates.code) {
            outcome.degraded.push(detection_source::SOURCE_FILES.to_string());
        }
        if fetched.any_failed(&candidates.config) {
            outcome.degraded.push(detection_source::CONFIG_FILES.to_string());
        }

        outcome
    }

    /// Picks pattern-scan and config-audit candidates out of a tree listing
    fn select_candidates(&self, tree: &[TreeEntry]) -> Candidates {
        let max_size = self.settings.pattern_limits.max_file_size_bytes;
        let files = tree.iter().filter(|entry| entry.is_file());

        let mut code: Vec<String> = files
            .clone()
            .filter(|entry| is_scannable(&entry.path))
            .filter(|entry| entry.size.map_or(true, |size| size <= max_size))
            .map(|entry| entry.path.clone())
            .collect();
        if code.len() > self.settings.max_source_files {
            tracing::info!(
                candidates = code.len(),
                limit = self.settings.max_source_files,
                "Source file limit reached, remaining files are not scanned"
            );
            code.truncate(self.settings.max_source_files);
        }

        let config = files
            .filter(|entry| ConfigTarget::classify(&entry.path).is_some())
            .map(|entry| entry.path.clone())
            .collect();

        Candidates { code, config }
    }

    async fn fetch_all(&self, repository: &RepositoryRef, paths: Vec<String>) -> FetchedFiles {
        let results: Vec<(String, _)> = stream::iter(paths)
            .map(|path: String| async move {
                let result = self.source_host.fetch_file(repository, &path).await;
                (path, result)
            })
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let mut fetched = FetchedFiles::default();
        for (path, result) in results {
            match result {
                Ok(Some(content)) => {
                    fetched.contents.insert(path, content);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to fetch file for analysis");
                    fetched.failed.insert(path);
                }
            }
        }
        fetched
    }
}

fn well_known_config_paths() -> Vec<String> {
    ConfigTarget::WELL_KNOWN_PATHS
        .iter()
        .map(|p| p.to_string())
        .collect()
}
