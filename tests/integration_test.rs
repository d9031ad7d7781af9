/// Integration tests for the scan pipeline
mod test_utilities;

use reposcan::prelude::*;
use reposcan::scanning::domain::{detection_source, ScanStatus};
use std::time::Duration;
use test_utilities::mocks::*;
use tokio_util::sync::CancellationToken;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "https://github.com/octo/demo";

fn sample_repository() -> MockSourceHost {
    MockSourceHost::new()
        .with_file("package.json", r#"{"dependencies": {"lodash": "^4.17.20"}}"#)
        .with_file("src/app.js", "const input = req.query.q;\neval(input);\n")
        .with_file(".env", "DEBUG=true\nDB_PASSWORD=hunter2\n")
        .with_file("README.md", "eval(x) in prose is not scanned")
}

fn request(scan_type: ScanType) -> ScanRequest {
    ScanRequest::new(REPO, None, scan_type)
}

#[tokio::test]
async fn test_full_scan_combines_all_sources() {
    let store = MockScanStore::new();
    let reporter = MockProgressReporter::new();
    let database = MockVulnerabilityDatabase::new().with_advisory("lodash", "CVE-2021-23337", "9.8", "4.17.21");
    let use_case = ScanRepositoryUseCase::new(
        sample_repository(),
        database.clone(),
        store.clone(),
        reporter.clone(),
        ScanSettings::default(),
    );

    let result = use_case
        .execute(request(ScanType::Full), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(database.queried.lock().unwrap().as_slice(), ["lodash"]);
    assert_eq!(result.severity_counts, SeverityCounts::new(2, 1, 1, 0));
    assert_eq!(result.security_score, 28);
    assert!(result.degraded_sources.is_empty());

    let dependency = result
        .vulnerabilities
        .iter()
        .find(|v| v.vulnerability_type() == VulnerabilityType::Dependency)
        .unwrap();
    assert_eq!(dependency.cve_id(), Some("CVE-2021-23337"));
    assert_eq!(dependency.affected_component(), Some("lodash"));
    assert_eq!(dependency.affected_version(), Some("4.17.20"));
    assert_eq!(dependency.fixed_version(), Some("4.17.21"));

    let code = result
        .vulnerabilities
        .iter()
        .find(|v| v.vulnerability_type() == VulnerabilityType::Code)
        .unwrap();
    assert_eq!(code.severity(), Severity::High);
    assert_eq!(code.affected_component(), Some("src/app.js"));

    let session = store.inner.sessions().pop().unwrap();
    assert_eq!(session.id(), result.scan_id);
    assert_eq!(session.status(), ScanStatus::Completed);
    assert_eq!(session.security_score(), 28);
    assert_eq!(store.inner.vulnerabilities(result.scan_id).len(), 4);
    assert!(store.inner.repository(REPO).unwrap().last_scanned_at.is_some());
    assert!(reporter.contains("security score 28/100"));
}

#[tokio::test]
async fn test_database_outage_degrades_instead_of_failing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/querybatch"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let database = OsvClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let store = MockScanStore::new();
    let use_case = ScanRepositoryUseCase::new(
        sample_repository(),
        database,
        store.clone(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );

    let result = use_case
        .execute(request(ScanType::Full), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        result.degraded_sources,
        vec![detection_source::VULNERABILITY_DATABASE.to_string()]
    );
    assert!(result
        .vulnerabilities
        .iter()
        .all(|v| v.vulnerability_type() != VulnerabilityType::Dependency));
    assert_eq!(result.severity_counts, SeverityCounts::new(1, 1, 1, 0));
    assert_eq!(store.inner.sessions()[0].status(), ScanStatus::Completed);
}

#[tokio::test]
async fn test_quick_scan_keeps_critical_findings_only() {
    let database = MockVulnerabilityDatabase::new().with_advisory("lodash", "GHSA-35jh-r3h4-6jhm", "7.2", "4.17.21");
    let use_case = ScanRepositoryUseCase::new(
        sample_repository(),
        database,
        MockScanStore::new(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );

    let result = use_case
        .execute(request(ScanType::Quick), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.vulnerabilities.len(), 1);
    let finding = &result.vulnerabilities[0];
    assert_eq!(finding.severity(), Severity::Critical);
    assert_eq!(finding.vulnerability_type(), VulnerabilityType::Configuration);
    assert_eq!(result.security_score, 75);
}

#[tokio::test]
async fn test_dependencies_scan_skips_source_analysis() {
    let use_case = ScanRepositoryUseCase::new(
        sample_repository(),
        MockVulnerabilityDatabase::new(),
        MockScanStore::new(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );

    let result = use_case
        .execute(request(ScanType::Dependencies), CancellationToken::new())
        .await
        .unwrap();

    assert!(result.vulnerabilities.is_empty());
    assert_eq!(result.security_score, 100);
}

#[tokio::test]
async fn test_tree_outage_falls_back_to_well_known_config() {
    let use_case = ScanRepositoryUseCase::new(
        sample_repository().without_tree(),
        MockVulnerabilityDatabase::new(),
        MockScanStore::new(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );

    let result = use_case
        .execute(request(ScanType::Full), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.degraded_sources, vec![detection_source::SOURCE_TREE.to_string()]);
    assert!(result
        .vulnerabilities
        .iter()
        .all(|v| v.vulnerability_type() == VulnerabilityType::Configuration));
    assert_eq!(result.vulnerabilities.len(), 2);
}

#[tokio::test]
async fn test_persistence_failure_fails_the_scan() {
    let store = MockScanStore::failing("save");
    let reporter = MockProgressReporter::new();
    let use_case = ScanRepositoryUseCase::new(
        sample_repository(),
        MockVulnerabilityDatabase::new(),
        store.clone(),
        reporter.clone(),
        ScanSettings::default(),
    );

    let err = use_case
        .execute(request(ScanType::Full), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ScanError>(),
        Some(ScanError::Persistence { .. })
    ));
    let sessions = store.inner.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status(), ScanStatus::Failed);
    assert!(sessions[0].error_message().unwrap().contains("connection refused"));
    assert!(reporter.contains("Scan failed"));
}

#[tokio::test]
async fn test_upsert_failure_creates_no_session() {
    let store = MockScanStore::failing("upsert");
    let use_case = ScanRepositoryUseCase::new(
        sample_repository(),
        MockVulnerabilityDatabase::new(),
        store.clone(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );

    let err = use_case
        .execute(request(ScanType::Full), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ScanError>().map(ScanError::exit_code),
        Some(ExitCode::ApplicationError)
    );
    assert_eq!(store.inner.session_count(), 0);
}

#[tokio::test]
async fn test_cancellation_marks_session_failed() {
    let store = MockScanStore::new();
    let use_case = ScanRepositoryUseCase::new(
        sample_repository().with_delay(Duration::from_secs(30)),
        MockVulnerabilityDatabase::new(),
        store.clone(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = use_case
        .execute(request(ScanType::Full), cancel)
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<ScanError>(), Some(ScanError::Cancelled)));
    let session = store.inner.sessions().pop().unwrap();
    assert_eq!(session.status(), ScanStatus::Failed);
    assert_eq!(session.error_message(), Some("scan cancelled"));
}

#[tokio::test]
async fn test_invalid_repository_url_is_rejected_before_storage() {
    let store = MockScanStore::new();
    let use_case = ScanRepositoryUseCase::new(
        sample_repository(),
        MockVulnerabilityDatabase::new(),
        store.clone(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );

    let err = use_case
        .execute(
            ScanRequest::new("not a url", None, ScanType::Full),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ScanError>().map(ScanError::exit_code),
        Some(ExitCode::InvalidArguments)
    );
    assert_eq!(store.inner.session_count(), 0);
}

#[tokio::test]
async fn test_report_formats_render_scan_result() {
    let use_case = ScanRepositoryUseCase::new(
        sample_repository(),
        MockVulnerabilityDatabase::new().with_advisory("lodash", "CVE-2021-23337", "9.8", "4.17.21"),
        MockScanStore::new(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );
    let result = use_case
        .execute(request(ScanType::Full), CancellationToken::new())
        .await
        .unwrap();
    let repository = RepositoryRef::parse(REPO, None).unwrap();
    let report = ScanReport::new(&repository, ScanType::Full, &result);

    let json = JsonReportFormatter::new().format(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["securityScore"], 28);
    assert_eq!(value["criticalCount"], 2);
    assert_eq!(value["vulnerabilities"].as_array().unwrap().len(), 4);

    let markdown = MarkdownReportFormatter::new().format(&report).unwrap();
    assert!(markdown.contains("CVE-2021-23337"));
    assert!(markdown.contains("### CRITICAL (2)"));
}

#[tokio::test]
async fn test_source_host_calls_share_one_concurrency_limit() {
    let mut host = sample_repository().with_delay(Duration::from_millis(20));
    for i in 0..12 {
        host = host.with_file(&format!("src/module_{}.js", i), "module.exports = {};\n");
    }
    let in_flight = host.in_flight();
    let settings = ScanSettings {
        max_concurrency: 2,
        ..ScanSettings::default()
    };
    let use_case = ScanRepositoryUseCase::new(
        host,
        MockVulnerabilityDatabase::new(),
        MockScanStore::new(),
        MockProgressReporter::new(),
        settings,
    );

    let result = use_case
        .execute(request(ScanType::Full), CancellationToken::new())
        .await
        .unwrap();

    assert!(result.degraded_sources.is_empty());
    assert_eq!(in_flight.peak(), 2);
}

#[tokio::test]
async fn test_every_advisory_survives_slow_hydration() {
    let server = MockServer::start().await;
    let results: Vec<_> = (0..20)
        .map(|i| json!({"vulns": [{"id": format!("PYSEC-{}", i)}]}))
        .collect();
    Mock::given(method("POST"))
        .and(path("/v1/querybatch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/vulns/PYSEC-\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "id": "PYSEC-2024-1",
                    "summary": "Remote code execution",
                    "database_specific": {"severity": "HIGH"}
                }))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let requirements: String = (0..20).map(|i| format!("pkg-{}==1.0.0\n", i)).collect();
    let settings = ScanSettings {
        request_timeout: Duration::from_secs(1),
        ..ScanSettings::default()
    };
    let use_case = ScanRepositoryUseCase::new(
        MockSourceHost::new().with_file("requirements.txt", &requirements),
        OsvClient::new(&server.uri(), Duration::from_secs(1)).unwrap(),
        MockScanStore::new(),
        MockProgressReporter::new(),
        settings,
    );

    let result = use_case
        .execute(request(ScanType::Dependencies), CancellationToken::new())
        .await
        .unwrap();

    assert!(result.degraded_sources.is_empty());
    assert_eq!(result.vulnerabilities.len(), 20);
    assert!(result
        .vulnerabilities
        .iter()
        .all(|v| v.vulnerability_type() == VulnerabilityType::Dependency && v.severity() == Severity::High));
}

#[tokio::test]
async fn test_repository_on_unserved_host_is_rejected() {
    let server = MockServer::start().await;
    let store = MockScanStore::new();
    let use_case = ScanRepositoryUseCase::new(
        GitHubSourceHost::new(&server.uri(), None, Duration::from_secs(5)).unwrap(),
        MockVulnerabilityDatabase::new(),
        store.clone(),
        MockProgressReporter::new(),
        ScanSettings::default(),
    );

    let err = use_case
        .execute(
            ScanRequest::new("https://gitlab.com/octo/demo", None, ScanType::Full),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ScanError>().map(ScanError::exit_code),
        Some(ExitCode::InvalidArguments)
    );
    assert_eq!(store.inner.session_count(), 0);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
