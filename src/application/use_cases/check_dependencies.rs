use super::fetch_manifests::{FetchManifestsUseCase, FetchedManifest};
use super::settings::ScanSettings;
use crate::ports::outbound::{SourceHost, VulnerabilityDatabase};
use crate::scanning::domain::{detection_source, DependencyMatch, PackageQuery, RepositoryRef};
use crate::scanning::parsers::parse_manifest;
use crate::scanning::services::{build_queries, ParsedManifest};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SERVICE: &str = "vulnerability-database";

/// Output of the dependency branch
#[derive(Debug, Default)]
pub struct DependencyCheckOutcome {
    /// One entry per raw record, in query order
    pub matches: Vec<DependencyMatch>,
    /// Number of deduplicated package queries built from the manifests
    pub query_count: usize,
    /// Detection sources that degraded on the way
    pub degraded: Vec<String>,
}

/// CheckDependenciesUseCase - the dependency branch of a scan
///
/// Fetches manifests, parses them, builds one deduplicated query batch and
/// resolves it against the vulnerability database. Every failure here is
/// non-fatal: the branch degrades and the scan carries on.
///
/// # Type Parameters
/// * `H` - SourceHost implementation
/// * `D` - VulnerabilityDatabase implementation
pub struct CheckDependenciesUseCase<'a, H, D> {
    source_host: &'a H,
    vulnerability_database: &'a D,
    settings: ScanSettings,
}

impl<'a, H, D> CheckDependenciesUseCase<'a, H, D>
where
    H: SourceHost,
    D: VulnerabilityDatabase,
{
    pub fn new(source_host: &'a H, vulnerability_database: &'a D, settings: ScanSettings) -> Self {
        Self {
            source_host,
            vulnerability_database,
            settings,
        }
    }

    pub async fn execute(&self, repository: &RepositoryRef) -> DependencyCheckOutcome {
        let mut outcome = DependencyCheckOutcome::default();

        // Step 1: Retrieve candidate manifests
        let fetched = FetchManifestsUseCase::new(self.source_host, self.settings)
            .execute(repository)
            .await;
        if let Some(e) = &fetched.error {
            tracing::warn!(repository = %repository.full_name(), error = %e, "Manifest retrieval degraded");
            outcome.degraded.push(detection_source::MANIFESTS.to_string());
        }

        // Step 2: Parse each manifest independently
        let parsed = Self::parse_all(&fetched.manifests);

        // Step 3: Build the query batch
        let queries = build_queries(&parsed);
        outcome.query_count = queries.len();
        if queries.is_empty() {
            tracing::debug!(repository = %repository.full_name(), "No dependency queries to resolve");
            return outcome;
        }

        // Step 4: Resolve the batch
        match self.query_database(&queries).await {
            Ok((matches, failed_chunks)) => {
                if failed_chunks > 0 {
                    outcome
                        .degraded
                        .push(detection_source::VULNERABILITY_DATABASE.to_string());
                }
                outcome.matches = matches;
            }
            Err(e) => {
                tracing::warn!(
                    service = SERVICE,
                    queries = queries.len(),
                    error = %e,
                    "Vulnerability lookup failed, continuing without dependency findings"
                );
                outcome
                    .degraded
                    .push(detection_source::VULNERABILITY_DATABASE.to_string());
            }
        }

        outcome
    }

    fn parse_all(manifests: &[FetchedManifest]) -> Vec<ParsedManifest> {
        manifests
            .iter()
            .filter_map(|manifest| {
                match parse_manifest(manifest.kind, &manifest.path, &manifest.content) {
                    Ok(queries) => {
                        tracing::debug!(path = %manifest.path, records = queries.len(), "Parsed manifest");
                        Some(ParsedManifest {
                            kind: manifest.kind,
                            path: manifest.path.clone(),
                            queries,
                        })
                    }
                    Err(e) => {
                        tracing::warn!(path = %manifest.path, error = %e, "Skipping unparsable manifest");
                        None
                    }
                }
            })
            .collect()
    }

    /// Sends the batch and pairs every returned record with its query
    async fn query_database(
        &self,
        queries: &[PackageQuery],
    ) -> crate::shared::Result<(Vec<DependencyMatch>, usize)> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("   {spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Querying vulnerability database for {} package(s)...", queries.len()));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let response = self.vulnerability_database.query_batch(queries).await;
        spinner.finish_and_clear();
        let response = response?;

        if response.results.len() != queries.len() {
            tracing::warn!(
                expected = queries.len(),
                received = response.results.len(),
                "Vulnerability database returned a misaligned batch; extra entries ignored"
            );
        }

        let matches = queries
            .iter()
            .zip(response.results)
            .flat_map(|(query, records)| {
                records.into_iter().map(move |record| DependencyMatch {
                    query: query.clone(),
                    record,
                })
            })
            .collect();

        Ok((matches, response.failed_chunks))
    }
}
