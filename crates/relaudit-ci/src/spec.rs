//! Audit parameters.

use std::path::PathBuf;

use relaudit_core::ConfigLocator;
use serde::{Deserialize, Serialize};

/// Parameters of one audit run.
///
/// Replaces the fixed release / branch / repository-root constants of a
/// one-off script with explicit values threaded into the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditSpec {
    /// Release being inspected, e.g. `4.8.0-fc.9`. `None` when the report
    /// was read from a file.
    pub release: Option<String>,

    /// Branch whose configuration file is validated.
    pub branch: String,

    /// Checkout of the release repository holding `ci-operator/config`.
    pub config_root: PathBuf,

    /// Number of repositories audited concurrently (at least 1).
    pub jobs: usize,

    /// Abort the whole run on the first configuration parse failure.
    pub strict_parse: bool,
}

impl AuditSpec {
    pub fn new(release: Option<String>, branch: impl Into<String>, config_root: impl Into<PathBuf>) -> Self {
        Self {
            release,
            branch: branch.into(),
            config_root: config_root.into(),
            jobs: 1,
            strict_parse: false,
        }
    }

    /// Set concurrency; values below 1 are raised to 1.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Make parse failures fatal to the run.
    pub fn strict(mut self) -> Self {
        self.strict_parse = true;
        self
    }

    /// Locator rooted at this spec's `config_root`.
    pub fn locator(&self) -> ConfigLocator {
        ConfigLocator::new(self.config_root.clone())
    }

    /// Release label for reports.
    pub fn release_label(&self) -> &str {
        self.release.as_deref().unwrap_or("unknown")
    }
}
