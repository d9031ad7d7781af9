use crate::scanning::services::PatternScanLimits;
use crate::shared::error::ScanError;
use crate::shared::Result;
use std::future::Future;
use std::time::Duration;

/// Runtime knobs of a scan, derived from the engine configuration
#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    /// Ceiling applied to each source-host and storage call
    pub request_timeout: Duration,
    /// Maximum in-flight requests against the source host, across all branches of a scan
    pub max_concurrency: usize,
    /// Maximum number of source files fetched for pattern scanning
    pub max_source_files: usize,
    pub pattern_limits: PatternScanLimits,
    /// Collapse repeated `(component, CVE)` reports after normalization
    pub dedupe_findings: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_concurrency: 8,
            max_source_files: 200,
            pattern_limits: PatternScanLimits {
                max_file_size_bytes: 500 * 1024,
                snippet_max_len: 200,
            },
            dedupe_findings: false,
        }
    }
}

/// Awaits `future` for at most `timeout`.
///
/// Elapsing is reported as `ScanError::UpstreamService` for `service`, the same
/// way any other upstream failure is.
pub async fn with_timeout<T, F>(service: &str, timeout: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ScanError::upstream(
            service,
            format!("timed out after {}ms", timeout.as_millis()),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let value = with_timeout("svc", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_with_timeout_elapsed_is_upstream_error() {
        let result: Result<()> = with_timeout("slow-host", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        match err.downcast_ref::<ScanError>() {
            Some(ScanError::UpstreamService { service, details }) => {
                assert_eq!(service, "slow-host");
                assert!(details.contains("timed out"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }
}
