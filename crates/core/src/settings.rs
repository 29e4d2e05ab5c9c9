//! Repository and cluster settings consumed by the watermark calculation

use crate::types::Principal;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Per-repository clustering configuration
pub trait RepositorySettings: Send + Sync {
    /// Every repository known to the deployment
    fn repository_names(&self) -> BTreeSet<String>;

    /// Worst-case delay before a commit from one cluster node is visible to
    /// every reader, or `None` when the repository is not clustered
    fn clustering_delay(&self, repository: &str) -> Option<Duration>;

    /// Repositories whose log entries bound the principal's cursor
    fn accessible_repositories(&self, _principal: &Principal) -> BTreeSet<String> {
        self.repository_names()
    }
}

/// Fixed repository table built at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRepositories {
    delays: BTreeMap<String, Option<Duration>>,
}

impl StaticRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a repository without clustering
    pub fn with_repository(mut self, name: impl Into<String>) -> Self {
        self.delays.insert(name.into(), None);
        self
    }

    /// Adds a clustered repository
    pub fn with_clustered_repository(mut self, name: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(name.into(), Some(delay));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }
}

impl RepositorySettings for StaticRepositories {
    fn repository_names(&self) -> BTreeSet<String> {
        self.delays.keys().cloned().collect()
    }

    fn clustering_delay(&self, repository: &str) -> Option<Duration> {
        self.delays.get(repository).copied().flatten()
    }
}
