//! Configuration locator.
//!
//! Maps a repository URL and branch to the ci-operator configuration file
//! inside a checkout of the release repository:
//!
//! `<root>/ci-operator/config/<owner>/<name>/<owner>-<name>-<branch>.yaml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::inventory::RepositoryId;

/// Hosting prefix every resolvable repository URL starts with.
pub const GITHUB_PREFIX: &str = "https://github.com/";

/// Why a repository could not be mapped to a configuration path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("repository {repo} is not hosted under {prefix}")]
    UnsupportedHost { repo: String, prefix: String },

    #[error("repository {repo} does not split into owner/name (got {segments} segment(s))")]
    MalformedPath { repo: String, segments: usize },

    #[error("repository {repo} has an empty owner or name segment")]
    EmptySegment { repo: String },

    #[error("branch name must not be empty")]
    EmptyBranch,
}

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCoordinates {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinates {
    /// Configuration file name for `branch`, e.g. `openshift-oc-master.yaml`.
    pub fn config_file_name(&self, branch: &str) -> String {
        format!("{}-{}-{}.yaml", self.owner, self.name, branch)
    }
}

/// Resolves configuration paths below a fixed root directory.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    config_root: PathBuf,
    host_prefix: String,
}

impl ConfigLocator {
    /// Create a locator for GitHub-hosted repositories rooted at `config_root`.
    pub fn new(config_root: impl Into<PathBuf>) -> Self {
        Self {
            config_root: config_root.into(),
            host_prefix: GITHUB_PREFIX.to_string(),
        }
    }

    /// Use a different hosting prefix (must include the trailing `/`).
    pub fn with_host_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.host_prefix = prefix.into();
        self
    }

    pub fn config_root(&self) -> &Path {
        &self.config_root
    }

    /// Split a repository URL into owner and name.
    pub fn coordinates(&self, repo: &RepositoryId) -> Result<RepoCoordinates, LocatorError> {
        let owner_repo = repo
            .as_str()
            .strip_prefix(self.host_prefix.as_str())
            .ok_or_else(|| LocatorError::UnsupportedHost {
                repo: repo.to_string(),
                prefix: self.host_prefix.clone(),
            })?;

        let parts: Vec<&str> = owner_repo.split('/').collect();
        if parts.len() != 2 {
            return Err(LocatorError::MalformedPath {
                repo: repo.to_string(),
                segments: parts.len(),
            });
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(LocatorError::EmptySegment {
                repo: repo.to_string(),
            });
        }

        Ok(RepoCoordinates {
            owner: parts[0].to_string(),
            name: parts[1].to_string(),
        })
    }

    /// Path of the configuration file for `repo` on `branch`.
    pub fn locate(&self, repo: &RepositoryId, branch: &str) -> Result<PathBuf, LocatorError> {
        if branch.is_empty() {
            return Err(LocatorError::EmptyBranch);
        }
        let coords = self.coordinates(repo)?;
        Ok(self
            .config_root
            .join("ci-operator")
            .join("config")
            .join(&coords.owner)
            .join(&coords.name)
            .join(coords.config_file_name(branch)))
    }
}
