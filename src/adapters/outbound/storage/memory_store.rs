use crate::ports::outbound::ScanStore;
use crate::scanning::domain::{RepositoryRef, ScanSession, ScanStatus, Vulnerability};
use crate::shared::error::ScanError;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Repository row kept by the in-memory store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRepository {
    pub id: Uuid,
    pub url: String,
    pub full_name: String,
    pub last_scanned_at: Option<DateTime<Utc>>,
}

/// InMemoryScanStore - process-local ScanStore backed by concurrent maps
///
/// Repositories are keyed by their canonical URL, so scanning the same
/// repository twice reuses its id. Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScanStore {
    repositories: Arc<DashMap<String, StoredRepository>>,
    sessions: Arc<DashMap<Uuid, ScanSession>>,
    vulnerabilities: Arc<DashMap<Uuid, Vec<Vulnerability>>>,
}

impl InMemoryScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repository(&self, url: &str) -> Option<StoredRepository> {
        self.repositories.get(url).map(|entry| entry.value().clone())
    }

    pub fn session(&self, scan_id: Uuid) -> Option<ScanSession> {
        self.sessions.get(&scan_id).map(|entry| entry.value().clone())
    }

    pub fn vulnerabilities(&self, scan_id: Uuid) -> Vec<Vulnerability> {
        self.vulnerabilities
            .get(&scan_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of every stored session, in no particular order
    pub fn sessions(&self) -> Vec<ScanSession> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Overwrites an existing session with its final state
    fn finish_session(&self, session: &ScanSession, operation: &str, expected: ScanStatus) -> Result<()> {
        if session.status() != expected {
            return Err(ScanError::persistence(
                operation,
                format!("session {} is {}, expected {}", session.id(), session.status(), expected),
            )
            .into());
        }
        match self.sessions.get_mut(&session.id()) {
            Some(mut stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(ScanError::persistence(operation, format!("unknown session {}", session.id())).into()),
        }
    }
}

#[async_trait]
impl ScanStore for InMemoryScanStore {
    async fn upsert_repository(&self, repository: &RepositoryRef) -> Result<Uuid> {
        let entry = self
            .repositories
            .entry(repository.url())
            .or_insert_with(|| StoredRepository {
                id: Uuid::new_v4(),
                url: repository.url(),
                full_name: repository.full_name(),
                last_scanned_at: None,
            });
        Ok(entry.id)
    }

    async fn create_session(&self, session: &ScanSession) -> Result<()> {
        if self.sessions.contains_key(&session.id()) {
            return Err(ScanError::persistence(
                "create session",
                format!("session {} already exists", session.id()),
            )
            .into());
        }
        self.sessions.insert(session.id(), session.clone());
        Ok(())
    }

    async fn save_vulnerabilities(&self, scan_id: Uuid, vulnerabilities: &[Vulnerability]) -> Result<()> {
        if !self.sessions.contains_key(&scan_id) {
            return Err(ScanError::persistence("save vulnerabilities", format!("unknown session {}", scan_id)).into());
        }
        self.vulnerabilities
            .entry(scan_id)
            .or_default()
            .extend(vulnerabilities.iter().cloned());
        Ok(())
    }

    async fn complete_session(&self, session: &ScanSession) -> Result<()> {
        self.finish_session(session, "complete session", ScanStatus::Completed)
    }

    async fn fail_session(&self, session: &ScanSession) -> Result<()> {
        self.finish_session(session, "fail session", ScanStatus::Failed)
    }

    async fn touch_repository(&self, repository_id: Uuid, scanned_at: DateTime<Utc>) -> Result<()> {
        let mut stored = self
            .repositories
            .iter_mut()
            .find(|entry| entry.id == repository_id)
            .ok_or_else(|| ScanError::persistence("touch repository", format!("unknown repository {}", repository_id)))?;
        stored.last_scanned_at = Some(scanned_at);
        Ok(())
    }
}
