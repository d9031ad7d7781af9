use crate::scanning::domain::RepositoryRef;
use crate::shared::Result;
use async_trait::async_trait;

/// Kind of an entry in a repository tree listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEntryKind {
    File,
    Directory,
}

/// One entry of a recursive repository tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: TreeEntryKind,
    /// Size in bytes, when the host reports it
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            path: path.into(),
            kind: TreeEntryKind::File,
            size,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == TreeEntryKind::File
    }
}

/// SourceHost port for reading repository content
///
/// Implementations target a code host (GitHub REST API, a local mirror, a mock).
/// An optional bearer credential is an implementation concern.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Rejects repositories this host cannot serve, before any request is made
    fn ensure_supported(&self, _repo: &RepositoryRef) -> Result<()> {
        Ok(())
    }

    /// Fetches one file at the repository's branch.
    ///
    /// # Returns
    /// `Ok(None)` when the file does not exist
    ///
    /// # Errors
    /// Transport, authentication and non-404 HTTP failures
    async fn fetch_file(&self, repo: &RepositoryRef, path: &str) -> Result<Option<String>>;

    /// Lists every entry of the branch recursively
    async fn fetch_tree(&self, repo: &RepositoryRef) -> Result<Vec<TreeEntry>>;
}
