//! reposcan - repository security scan engine
//!
//! Combines three independent detection strategies over a GitHub
//! repository and reduces their findings to a single security score:
//!
//! - known-vulnerability lookup of declared dependencies against OSV
//! - heuristic pattern matching over source files
//! - fixed-rule auditing of well-known configuration files
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Scanning** (`scanning`): Domain model, manifest parsers, rule catalogues and pure services
//! - **Application Layer** (`application`): Use cases, DTOs and report read models
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): GitHub, OSV, storage, console and output implementations
//! - **Shared** (`shared`): Error taxonomy and result alias
//!
//! # Example
//!
//! ```no_run
//! use reposcan::prelude::*;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<()> {
//! let settings = ScanSettings::default();
//! let use_case = ScanRepositoryUseCase::new(
//!     GitHubSourceHost::new(GitHubSourceHost::DEFAULT_API_URL, None, Duration::from_secs(30))?,
//!     OsvClient::new(OsvClient::DEFAULT_API_URL, Duration::from_secs(30))?,
//!     InMemoryScanStore::new(),
//!     StderrProgressReporter::new(),
//!     settings,
//! );
//!
//! let request = ScanRequest::new("https://github.com/octo/demo", None, ScanType::Full);
//! let result = use_case.execute(request, CancellationToken::new()).await?;
//! println!("security score: {}", result.security_score);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod logging;
pub mod ports;
pub mod scanning;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
    pub use crate::adapters::outbound::formatters::{JsonReportFormatter, MarkdownReportFormatter};
    pub use crate::adapters::outbound::network::{GitHubSourceHost, OsvClient};
    pub use crate::adapters::outbound::storage::InMemoryScanStore;
    pub use crate::application::dto::{OutputFormat, ScanRequest, ScanResponse};
    pub use crate::application::read_models::ScanReport;
    pub use crate::application::use_cases::{ScanRepositoryUseCase, ScanSettings};
    pub use crate::config::EngineConfig;
    pub use crate::ports::inbound::ScanRepositoryPort;
    pub use crate::ports::outbound::{
        OutputPresenter, ProgressReporter, ScanReportFormatter, ScanStore, SourceHost,
        VulnerabilityDatabase,
    };
    pub use crate::scanning::domain::{
        RepositoryRef, ScanResult, ScanType, Severity, SeverityCounts, Vulnerability,
        VulnerabilityType,
    };
    pub use crate::shared::error::{ExitCode, ScanError};
    pub use crate::shared::Result;
}
