pub mod advisory;
pub mod finding;
pub mod package_query;
pub mod repository;
pub mod scan_result;
pub mod scan_session;
pub mod severity;
pub mod vulnerability;

pub use advisory::{AffectedPackage, DependencyMatch, RawVulnerabilityRecord, SeverityDescriptor};
pub use finding::{CodeFinding, ConfigFinding};
pub use package_query::{Ecosystem, PackageQuery};
pub use repository::{RepositoryRef, ScanType, DEFAULT_BRANCH};
pub use scan_result::{detection_source, ScanResult};
pub use scan_session::{ScanSession, ScanStatus};
pub use severity::{CvssScore, Severity, SeverityCounts};
pub use vulnerability::{Vulnerability, VulnerabilityDraft, VulnerabilityType};
