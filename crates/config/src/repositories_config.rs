//! Repository table configuration section

use crate::validation::{ConfigSection, ValidationReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use syncwatch_core::RepositorySettings;

/// One repository of the deployment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Repository name, as recorded in log entries
    pub name: String,

    /// Whether several nodes write to this repository's log
    #[serde(default)]
    pub clustering_enabled: bool,

    /// Worst-case delay before one node's commit is visible to all readers
    #[serde(default)]
    pub clustering_delay_ms: u64,
}

impl RepositoryConfig {
    /// A repository without clustering
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clustering_enabled: false,
            clustering_delay_ms: 0,
        }
    }

    /// A clustered repository
    pub fn clustered(name: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            name: name.into(),
            clustering_enabled: true,
            clustering_delay_ms: delay_ms,
        }
    }

    /// Effective delay; a disabled cluster has none
    pub fn delay(&self) -> Option<Duration> {
        if self.clustering_enabled && self.clustering_delay_ms > 0 {
            Some(Duration::from_millis(self.clustering_delay_ms))
        } else {
            None
        }
    }
}

/// Every repository the change finder may bound a cursor over
///
/// Written as `[[repositories]]` tables in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RepositoryTable {
    repositories: Vec<RepositoryConfig>,
}

impl Default for RepositoryTable {
    fn default() -> Self {
        Self {
            repositories: vec![RepositoryConfig::new("default")],
        }
    }
}

impl RepositoryTable {
    pub fn new(repositories: Vec<RepositoryConfig>) -> Self {
        Self { repositories }
    }

    /// Iterates over the configured repositories
    pub fn iter(&self) -> impl Iterator<Item = &RepositoryConfig> {
        self.repositories.iter()
    }

    /// Looks up a repository by name
    pub fn get(&self, name: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl RepositorySettings for RepositoryTable {
    fn repository_names(&self) -> BTreeSet<String> {
        self.repositories.iter().map(|r| r.name.clone()).collect()
    }

    fn clustering_delay(&self, repository: &str) -> Option<Duration> {
        self.get(repository).and_then(RepositoryConfig::delay)
    }
}

impl ConfigSection for RepositoryTable {
    fn check(&self, report: &mut ValidationReport) {
        if self.repositories.is_empty() {
            report.reject("repositories", "no repository is listed");
        }
        report.require_distinct(
            "repositories.name",
            self.repositories.iter().map(|r| r.name.as_str()),
        );

        for repository in &self.repositories {
            report.require_text("repositories.name", &repository.name);
            // The delay only matters once clustering is on
            if repository.clustering_enabled {
                report.require_within(
                    "repositories.clustering_delay_ms",
                    repository.clustering_delay_ms,
                    1..=3_600_000,
                );
            }
        }
    }
}
