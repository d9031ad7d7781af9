use super::analyze_sources::{AnalyzeSourcesUseCase, SourceAnalysisOutcome};
use super::check_dependencies::{CheckDependenciesUseCase, DependencyCheckOutcome};
use super::settings::{with_timeout, ScanSettings};
use super::throttle::ThrottledSourceHost;
use crate::application::dto::ScanRequest;
use crate::ports::inbound::ScanRepositoryPort;
use crate::ports::outbound::{ProgressReporter, ScanStore, SourceHost, VulnerabilityDatabase};
use crate::scanning::domain::{
    RepositoryRef, ScanResult, ScanSession, ScanType, Severity, SeverityCounts, Vulnerability,
};
use crate::scanning::services::{dedupe_vulnerabilities, normalize, security_score};
use crate::shared::error::ScanError;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use tokio_util::sync::CancellationToken;

const STORE: &str = "scan-store";

/// Findings gathered by the detection phase, before normalization
struct Detection {
    dependencies: DependencyCheckOutcome,
    sources: SourceAnalysisOutcome,
}

/// ScanRepositoryUseCase - the scan session controller
///
/// Drives one scan from request to result:
/// `pending -> scanning -> {completed, failed}`.
/// Detection branches degrade on their own; only an invalid request, a
/// storage failure or cancellation ends a scan early.
///
/// # Type Parameters
/// * `H` - SourceHost implementation
/// * `D` - VulnerabilityDatabase implementation
/// * `S` - ScanStore implementation
/// * `P` - ProgressReporter implementation
pub struct ScanRepositoryUseCase<H, D, S, P> {
    source_host: H,
    vulnerability_database: D,
    scan_store: S,
    progress_reporter: P,
    settings: ScanSettings,
}

impl<H, D, S, P> ScanRepositoryUseCase<H, D, S, P>
where
    H: SourceHost,
    D: VulnerabilityDatabase,
    S: ScanStore,
    P: ProgressReporter,
{
    /// Creates a new ScanRepositoryUseCase with injected dependencies
    pub fn new(
        source_host: H,
        vulnerability_database: D,
        scan_store: S,
        progress_reporter: P,
        settings: ScanSettings,
    ) -> Self {
        Self {
            source_host,
            vulnerability_database,
            scan_store,
            progress_reporter,
            settings,
        }
    }

    /// Executes one scan
    ///
    /// # Arguments
    /// * `request` - Scan trigger: repository URL, optional branch, scan type
    /// * `cancel` - Abandons the detection phase when fired
    ///
    /// # Returns
    /// The scan result, also persisted through the `ScanStore`
    pub async fn execute(&self, request: ScanRequest, cancel: CancellationToken) -> Result<ScanResult> {
        // Step 1: Validate the request (no session exists yet on failure)
        let repository = request.validate()?;
        self.source_host.ensure_supported(&repository)?;
        let scan_type = request.scan_type;
        self.progress_reporter.report(&format!(
            "🔍 Scanning {} (branch: {}, type: {})",
            repository.url(),
            repository.branch(),
            scan_type.as_str()
        ));

        // Step 2: Establish repository identity
        let repository_id = self
            .store_call("upsert repository", self.scan_store.upsert_repository(&repository))
            .await?;

        // Step 3: Open the session
        let mut session = ScanSession::new(repository_id);
        session.start()?;
        if let Err(e) = self
            .store_call("create session", self.scan_store.create_session(&session))
            .await
        {
            return Err(self.abort(&mut session, e).await);
        }
        tracing::info!(
            scan_id = %session.id(),
            repository = %repository.full_name(),
            branch = repository.branch(),
            scan_type = scan_type.as_str(),
            "Scan started"
        );

        // Step 4: Run detection, racing cancellation
        let detection = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            detection = self.detect(&repository, scan_type) => Some(detection),
        };
        let Some(detection) = detection else {
            tracing::info!(scan_id = %session.id(), "Scan cancelled");
            return Err(self.abort(&mut session, ScanError::Cancelled.into()).await);
        };

        // Step 5: Normalize and score
        let degraded_sources = Self::collect_degraded(&detection);
        let vulnerabilities = self.normalize_findings(&detection, scan_type);
        let severity_counts: SeverityCounts = vulnerabilities.iter().map(Vulnerability::severity).collect();
        let score = security_score(&severity_counts);

        // Step 6: Persist results
        if !vulnerabilities.is_empty() {
            if let Err(e) = self
                .store_call(
                    "save vulnerabilities",
                    self.scan_store.save_vulnerabilities(session.id(), &vulnerabilities),
                )
                .await
            {
                return Err(self.abort(&mut session, e).await);
            }
        }

        let mut completed = session.clone();
        completed.complete(score, severity_counts)?;
        if let Err(e) = self
            .store_call("complete session", self.scan_store.complete_session(&completed))
            .await
        {
            return Err(self.abort(&mut session, e).await);
        }

        // Step 7: Best-effort bookkeeping
        let scanned_at = completed.completed_at().unwrap_or_else(Utc::now);
        if let Err(e) = self
            .store_call("touch repository", self.scan_store.touch_repository(repository_id, scanned_at))
            .await
        {
            tracing::warn!(scan_id = %completed.id(), error = %e, "Failed to record last scan time");
        }

        // Step 8: Report and build the result
        self.report_summary(&completed, &degraded_sources);
        Ok(ScanResult {
            scan_id: completed.id(),
            repository_id,
            security_score: score,
            severity_counts,
            vulnerabilities,
            duration_ms: completed.duration_ms().unwrap_or_default(),
            timestamp: scanned_at,
            degraded_sources,
        })
    }

    /// Runs the dependency branch and the source branches concurrently
    ///
    /// Both branches share one request pool against the source host.
    async fn detect(&self, repository: &RepositoryRef, scan_type: ScanType) -> Detection {
        let source_host = ThrottledSourceHost::new(&self.source_host, &self.settings);
        let check_dependencies =
            CheckDependenciesUseCase::new(&source_host, &self.vulnerability_database, self.settings);
        let analyze_sources = AnalyzeSourcesUseCase::new(&source_host, self.settings);

        let dependency_branch = async {
            if !scan_type.runs_dependencies() {
                return DependencyCheckOutcome::default();
            }
            check_dependencies.execute(repository).await
        };
        let source_branch = analyze_sources.execute(repository, scan_type);

        let (dependencies, sources) = tokio::join!(dependency_branch, source_branch);

        self.progress_reporter.report(&format!(
            "📦 Resolved {} package(s), {} advisory match(es)",
            dependencies.query_count,
            dependencies.matches.len()
        ));
        if scan_type.runs_static_analysis() || scan_type.runs_config_audit() {
            self.progress_reporter.report(&format!(
                "🧪 Scanned {} source file(s): {} code finding(s), {} configuration finding(s)",
                sources.files_scanned,
                sources.code.len(),
                sources.config.len()
            ));
        }

        Detection { dependencies, sources }
    }

    fn normalize_findings(&self, detection: &Detection, scan_type: ScanType) -> Vec<Vulnerability> {
        let mut vulnerabilities = normalize(
            &detection.dependencies.matches,
            &detection.sources.code,
            &detection.sources.config,
        );
        if scan_type.critical_only() {
            vulnerabilities.retain(|v| v.severity() == Severity::Critical);
        }
        if self.settings.dedupe_findings {
            let before = vulnerabilities.len();
            vulnerabilities = dedupe_vulnerabilities(vulnerabilities);
            tracing::debug!(removed = before - vulnerabilities.len(), "Deduplicated findings");
        }
        vulnerabilities
    }

    fn collect_degraded(detection: &Detection) -> Vec<String> {
        let mut degraded: Vec<String> = Vec::new();
        for source in detection
            .dependencies
            .degraded
            .iter()
            .chain(&detection.sources.degraded)
        {
            if !degraded.contains(source) {
                degraded.push(source.clone());
            }
        }
        degraded
    }

    /// Storage call with the request timeout, failures raised as persistence errors
    async fn store_call<T, F>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        with_timeout(STORE, self.settings.request_timeout, future)
            .await
            .map_err(|e| match e.downcast_ref::<ScanError>() {
                Some(ScanError::Persistence { .. }) => e,
                _ => ScanError::persistence(operation, format!("{:#}", e)).into(),
            })
    }

    /// Moves the session to `failed`, persists that best-effort and hands the error back
    async fn abort(&self, session: &mut ScanSession, error: anyhow::Error) -> anyhow::Error {
        let message = match error.downcast_ref::<ScanError>() {
            Some(ScanError::Cancelled) => "scan cancelled".to_string(),
            _ => error.to_string(),
        };
        if let Err(e) = session.fail(message.clone()) {
            tracing::warn!(scan_id = %session.id(), error = %e, "Session already terminal");
        }
        if let Err(e) = self
            .store_call("fail session", self.scan_store.fail_session(session))
            .await
        {
            tracing::warn!(scan_id = %session.id(), error = %e, "Failed to persist failed session");
        }
        tracing::error!(scan_id = %session.id(), error = %message, "Scan failed");
        self.progress_reporter
            .report_error(&format!("❌ Scan failed: {}", message));
        error
    }

    fn report_summary(&self, session: &ScanSession, degraded_sources: &[String]) {
        if !degraded_sources.is_empty() {
            self.progress_reporter.report_error(&format!(
                "⚠️  Some detection sources were unavailable: {}",
                degraded_sources.join(", ")
            ));
        }
        tracing::info!(
            scan_id = %session.id(),
            score = session.security_score(),
            vulnerabilities = session.total_vulnerabilities(),
            duration_ms = session.duration_ms().unwrap_or_default(),
            "Scan completed"
        );
        self.progress_reporter.report_completion(&format!(
            "✅ Scan completed: security score {}/100, {} vulnerability(ies)",
            session.security_score(),
            session.total_vulnerabilities()
        ));
    }
}

#[async_trait]
impl<H, D, S, P> ScanRepositoryPort for ScanRepositoryUseCase<H, D, S, P>
where
    H: SourceHost,
    D: VulnerabilityDatabase,
    S: ScanStore,
    P: ProgressReporter,
{
    async fn scan(&self, request: ScanRequest, cancel: CancellationToken) -> Result<ScanResult> {
        self.execute(request, cancel).await
    }
}
