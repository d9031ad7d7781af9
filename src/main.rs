use owo_colors::OwoColorize;
use reposcan::adapters::outbound::console::StderrProgressReporter;
use reposcan::adapters::outbound::network::{GitHubSourceHost, OsvClient};
use reposcan::adapters::outbound::storage::InMemoryScanStore;
use reposcan::application::dto::ScanRequest;
use reposcan::application::factories::{FormatterFactory, PresenterFactory, PresenterType};
use reposcan::application::read_models::ScanReport;
use reposcan::application::use_cases::ScanRepositoryUseCase;
use reposcan::cli::Args;
use reposcan::config::{ConfigOverrides, EngineConfig};
use reposcan::logging::init_tracing;
use reposcan::scanning::domain::{ScanResult, Severity};
use reposcan::shared::error::{ExitCode, ScanError};
use reposcan::shared::Result;
use std::path::Path;
use std::process;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n{}\n", "❌ An error occurred:".red().bold());
            eprintln!("{}", e);

            // Display error chain
            for cause in e.chain().skip(1) {
                eprintln!("\nCaused by: {}", cause);
            }
            eprintln!();

            e.downcast_ref::<ScanError>()
                .map(ScanError::exit_code)
                .unwrap_or(ExitCode::ApplicationError)
        }
    };
    process::exit(code.as_i32());
}

async fn run() -> Result<ExitCode> {
    let args = Args::parse_args();

    let overrides = ConfigOverrides {
        github_token: args.token.clone(),
        log_level: args.log_level.clone(),
        log_format: args.log_format,
        fail_on: args.fail_on,
    };
    let config = EngineConfig::load(args.config.as_deref(), Path::new("."), overrides)?;
    init_tracing(&config.log_level, config.log_format)?;

    // Reject malformed input before any adapter is built
    let request = ScanRequest::new(args.repo_url.clone(), args.branch.clone(), args.scan_type);
    let repository = request.validate()?;

    // Create adapters (Dependency Injection)
    let source_host = GitHubSourceHost::new(
        &config.github_api_url,
        config.github_token.as_deref(),
        config.request_timeout,
    )?;
    let vulnerability_database = OsvClient::new(&config.osv_api_url, config.request_timeout)?;
    let scan_store = InMemoryScanStore::new();
    let progress_reporter = StderrProgressReporter::new();

    let use_case = ScanRepositoryUseCase::new(
        source_host,
        vulnerability_database,
        scan_store,
        progress_reporter,
        config.scan_settings(),
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let result = use_case.execute(request, cancel).await?;

    // Format and present the report
    eprintln!("{}", FormatterFactory::progress_message(args.format));
    let report = ScanReport::new(&repository, args.scan_type, &result);
    let formatted = FormatterFactory::create(args.format).format(&report)?;
    PresenterFactory::create(PresenterType::from(args.output.clone())).present(&formatted)?;

    Ok(exit_code_for(&result, config.fail_on))
}

/// Cancels the running scan on Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("{}", "⚠️  Interrupted, cancelling scan...".yellow());
                cancel.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
}

fn exit_code_for(result: &ScanResult, fail_on: Option<Severity>) -> ExitCode {
    let Some(threshold) = fail_on else {
        return ExitCode::Success;
    };
    let worst = result.vulnerabilities.iter().map(|v| v.severity()).max();
    match worst {
        Some(severity) if severity >= threshold => {
            eprintln!(
                "{}",
                format!(
                    "🚨 Findings at or above {} were detected (worst: {})",
                    threshold, severity
                )
                .red()
            );
            ExitCode::VulnerabilitiesDetected
        }
        _ => ExitCode::Success,
    }
}
