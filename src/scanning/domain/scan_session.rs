use super::severity::SeverityCounts;
use crate::shared::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Scanning,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Scanning => "scanning",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One end-to-end execution of the detection pipeline.
///
/// State machine: `pending -> scanning -> {completed, failed}`. Terminal
/// states reject further transitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSession {
    id: Uuid,
    repository_id: Uuid,
    status: ScanStatus,
    security_score: u8,
    total_vulnerabilities: usize,
    severity_counts: SeverityCounts,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    duration_ms: Option<u64>,
    error_message: Option<String>,
}

impl ScanSession {
    pub fn new(repository_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            repository_id,
            status: ScanStatus::Pending,
            security_score: 100,
            total_vulnerabilities: 0,
            severity_counts: SeverityCounts::default(),
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            error_message: None,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.ensure_status(ScanStatus::Pending, "start")?;
        self.status = ScanStatus::Scanning;
        self.started_at = Utc::now();
        Ok(())
    }

    pub fn complete(&mut self, security_score: u8, severity_counts: SeverityCounts) -> Result<()> {
        self.ensure_status(ScanStatus::Scanning, "complete")?;
        if security_score > 100 {
            anyhow::bail!("Security score must be within 0..=100, got {}", security_score);
        }
        let completed_at = Utc::now();
        self.status = ScanStatus::Completed;
        self.security_score = security_score;
        self.severity_counts = severity_counts;
        self.total_vulnerabilities = severity_counts.total();
        self.duration_ms = Some(elapsed_ms(self.started_at, completed_at));
        self.completed_at = Some(completed_at);
        Ok(())
    }

    pub fn fail(&mut self, error_message: impl Into<String>) -> Result<()> {
        if self.status.is_terminal() {
            anyhow::bail!("Cannot fail scan {}: already {}", self.id, self.status);
        }
        let completed_at = Utc::now();
        self.status = ScanStatus::Failed;
        self.error_message = Some(error_message.into());
        self.duration_ms = Some(elapsed_ms(self.started_at, completed_at));
        self.completed_at = Some(completed_at);
        Ok(())
    }

    fn ensure_status(&self, expected: ScanStatus, transition: &str) -> Result<()> {
        if self.status != expected {
            anyhow::bail!(
                "Cannot {} scan {}: expected status {}, found {}",
                transition,
                self.id,
                expected,
                self.status
            );
        }
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn repository_id(&self) -> Uuid {
        self.repository_id
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn security_score(&self) -> u8 {
        self.security_score
    }

    pub fn total_vulnerabilities(&self) -> usize {
        self.total_vulnerabilities
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        self.severity_counts
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_pending() {
        let session = ScanSession::new(Uuid::new_v4());
        assert_eq!(session.status(), ScanStatus::Pending);
        assert_eq!(session.security_score(), 100);
        assert!(session.completed_at().is_none());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut session = ScanSession::new(Uuid::new_v4());
        session.start().unwrap();
        assert_eq!(session.status(), ScanStatus::Scanning);

        let counts = SeverityCounts::new(1, 2, 0, 3);
        session.complete(36, counts).unwrap();
        assert_eq!(session.status(), ScanStatus::Completed);
        assert_eq!(session.security_score(), 36);
        assert_eq!(session.total_vulnerabilities(), 6);
        assert_eq!(session.total_vulnerabilities(), session.severity_counts().total());
        assert!(session.completed_at().is_some());
        assert!(session.duration_ms().is_some());
    }

    #[test]
    fn test_complete_requires_scanning() {
        let mut session = ScanSession::new(Uuid::new_v4());
        assert!(session.complete(100, SeverityCounts::default()).is_err());
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut session = ScanSession::new(Uuid::new_v4());
        session.start().unwrap();
        session.fail("storage down").unwrap();
        assert_eq!(session.status(), ScanStatus::Failed);
        assert_eq!(session.error_message(), Some("storage down"));

        assert!(session.start().is_err());
        assert!(session.complete(90, SeverityCounts::default()).is_err());
        assert!(session.fail("again").is_err());
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let mut session = ScanSession::new(Uuid::new_v4());
        session.start().unwrap();
        assert!(session.complete(101, SeverityCounts::default()).is_err());
        assert_eq!(session.status(), ScanStatus::Scanning);
    }
}
