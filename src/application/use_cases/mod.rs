/// Use cases module containing application business logic orchestration
mod analyze_sources;
mod check_dependencies;
mod fetch_manifests;
mod scan_repository;
mod settings;
mod throttle;

pub use analyze_sources::{AnalyzeSourcesUseCase, SourceAnalysisOutcome};
pub use check_dependencies::{CheckDependenciesUseCase, DependencyCheckOutcome};
pub use fetch_manifests::{FetchManifestsUseCase, FetchedManifest, ManifestFetchOutcome};
pub use scan_repository::ScanRepositoryUseCase;
pub use settings::{with_timeout, ScanSettings};
pub use throttle::ThrottledSourceHost;
