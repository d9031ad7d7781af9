use async_trait::async_trait;
use reposcan::ports::outbound::TreeEntry;
use reposcan::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counts concurrent calls against the mock host
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock SourceHost serving an in-memory repository
#[derive(Default)]
pub struct MockSourceHost {
    files: BTreeMap<String, String>,
    tree_unavailable: bool,
    delay: Option<Duration>,
    in_flight: Arc<InFlight>,
}

impl MockSourceHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    /// Makes the tree listing fail with an upstream error
    pub fn without_tree(mut self) -> Self {
        self.tree_unavailable = true;
        self
    }

    /// Delays every file fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared view of the concurrent-call counters
    pub fn in_flight(&self) -> Arc<InFlight> {
        Arc::clone(&self.in_flight)
    }
}

#[async_trait]
impl SourceHost for MockSourceHost {
    async fn fetch_file(&self, _repo: &RepositoryRef, path: &str) -> Result<Option<String>> {
        self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.leave();
        Ok(self.files.get(path).cloned())
    }

    async fn fetch_tree(&self, _repo: &RepositoryRef) -> Result<Vec<TreeEntry>> {
        if self.tree_unavailable {
            return Err(ScanError::upstream("github", "HTTP 502 Bad Gateway").into());
        }
        Ok(self
            .files
            .iter()
            .map(|(path, content)| TreeEntry::file(path.clone(), Some(content.len() as u64)))
            .collect())
    }
}
