//! Audit pipeline orchestration.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use relaudit_core::{
    extract_repositories, AuditError, ConfigLocator, ReleaseBuildConfiguration, RepositoryId,
    RepositoryList, RuleSet,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::loader::{ConfigLoader, LoadError};
use crate::release_info::{ReleaseInfoError, ReleaseInfoSource};
use crate::report::{AuditReport, RepositoryAudit, RepositoryStatus};
use crate::spec::AuditSpec;

/// Errors that abort an audit run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to fetch release report: {0}")]
    ReleaseInfo(#[from] ReleaseInfoError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("failed to parse configuration for {repo} at {path:?}: {source}")]
    Parse {
        repo: RepositoryId,
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Audit pipeline orchestrator.
pub struct AuditPipeline;

impl AuditPipeline {
    /// Run a full audit: fetch the release report, extract repositories and
    /// audit each of them.
    ///
    /// Only run-wide failures are returned as errors: the report could not be
    /// fetched, has no images section, or (with `strict_parse`) a
    /// configuration failed to parse. Everything else is recorded per
    /// repository in the returned report.
    pub async fn run(
        source: &dyn ReleaseInfoSource,
        loader: &dyn ConfigLoader,
        spec: &AuditSpec,
        rules: &RuleSet,
    ) -> Result<AuditReport, PipelineError> {
        let start = Instant::now();
        let started_at = Utc::now();
        let audit_id = Uuid::new_v4();

        info!(
            audit_id = %audit_id,
            release = spec.release_label(),
            branch = %spec.branch,
            source = %source.describe(),
            "Starting release coverage audit"
        );

        let text = source.fetch().await?;
        let repos = extract_repositories(&text)?;
        info!(repositories = repos.len(), "Extracted release repositories");

        let repositories = Self::audit_repositories(repos, loader, spec, rules).await?;

        let report = AuditReport {
            audit_id,
            release: spec.release_label().to_string(),
            branch: spec.branch.clone(),
            rules_digest: rules.digest(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            repositories,
        };

        info!(
            audit_id = %audit_id,
            matched = report.matched_count(),
            violations = report.violation_count(),
            repository_errors = report.repository_error_count(),
            "Release coverage audit completed"
        );

        Ok(report)
    }

    /// Audit every repository, `spec.jobs` at a time. Results keep the
    /// order of `repos`.
    pub async fn audit_repositories(
        repos: RepositoryList,
        loader: &dyn ConfigLoader,
        spec: &AuditSpec,
        rules: &RuleSet,
    ) -> Result<Vec<RepositoryAudit>, PipelineError> {
        let locator = spec.locator();
        let locator = &locator;

        stream::iter(repos)
            .map(|repo| Self::audit_repository(repo, loader, locator, spec, rules))
            .buffered(spec.jobs.max(1))
            .try_collect()
            .await
    }

    /// Audit a single repository.
    pub async fn audit_repository(
        repo: RepositoryId,
        loader: &dyn ConfigLoader,
        locator: &ConfigLocator,
        spec: &AuditSpec,
        rules: &RuleSet,
    ) -> Result<RepositoryAudit, PipelineError> {
        let path = match locator.locate(&repo, &spec.branch) {
            Ok(path) => path,
            Err(e) => {
                warn!(repo = %repo, error = %e, "Cannot locate configuration");
                return Ok(RepositoryAudit {
                    repository: repo,
                    config_path: None,
                    status: RepositoryStatus::Unresolved {
                        reason: e.to_string(),
                    },
                });
            }
        };
        debug!(repo = %repo, path = %path.display(), "Resolved configuration path");

        let bytes = match loader.load(&path).await {
            Ok(bytes) => bytes,
            Err(LoadError::NotFound(_)) => {
                warn!(repo = %repo, path = %path.display(), "Configuration file not found");
                return Ok(RepositoryAudit {
                    repository: repo,
                    config_path: Some(path),
                    status: RepositoryStatus::ConfigMissing,
                });
            }
            Err(e) => {
                warn!(repo = %repo, error = %e, "Failed to read configuration");
                return Ok(RepositoryAudit {
                    repository: repo,
                    config_path: Some(path),
                    status: RepositoryStatus::LoadFailed {
                        error: e.to_string(),
                    },
                });
            }
        };

        let config = match ReleaseBuildConfiguration::from_yaml(&bytes) {
            Ok(config) => config,
            Err(source) if spec.strict_parse => {
                return Err(PipelineError::Parse { repo, path, source });
            }
            Err(e) => {
                warn!(repo = %repo, path = %path.display(), error = %e, "Failed to parse configuration");
                return Ok(RepositoryAudit {
                    repository: repo,
                    config_path: Some(path),
                    status: RepositoryStatus::ParseFailed {
                        error: e.to_string(),
                    },
                });
            }
        };

        check_metadata(&repo, locator, &spec.branch, &config);

        let evaluations = rules.evaluate(repo.as_str(), &config);
        Ok(RepositoryAudit {
            repository: repo,
            config_path: Some(path),
            status: RepositoryStatus::Evaluated { evaluations },
        })
    }
}

/// Warn when the generated metadata disagrees with where the file was found.
fn check_metadata(
    repo: &RepositoryId,
    locator: &ConfigLocator,
    branch: &str,
    config: &ReleaseBuildConfiguration,
) {
    let (Some(meta), Ok(coords)) = (&config.zz_generated_metadata, locator.coordinates(repo)) else {
        return;
    };
    if meta.org != coords.owner || meta.repo != coords.name || meta.branch != branch {
        warn!(
            repo = %repo,
            org = %meta.org,
            name = %meta.repo,
            branch = %meta.branch,
            "Configuration metadata does not match its location"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{MemoryConfigLoader, StaticReleaseInfo};
    use relaudit_core::Verdict;

    const COMPLIANT: &str = "tests:
- as: e2e-aws
- as: e2e-aws-serial
- as: e2e-aws-upgrade
";

    fn spec() -> AuditSpec {
        AuditSpec::new(Some("4.8.0-fc.9".to_string()), "master", "/release")
    }

    fn path_for(owner: &str, name: &str) -> PathBuf {
        PathBuf::from(format!(
            "/release/ci-operator/config/{0}/{1}/{0}-{1}-master.yaml",
            owner, name
        ))
    }

    #[tokio::test]
    async fn test_unresolved_repository_is_recorded() {
        let loader = MemoryConfigLoader::new();
        let rules = RuleSet::standard().expect("rules");
        let spec = spec();
        let audit = AuditPipeline::audit_repository(
            RepositoryId::new("https://gitlab.com/x/y"),
            &loader,
            &spec.locator(),
            &spec,
            &rules,
        )
        .await
        .expect("audit failed");
        assert!(matches!(audit.status, RepositoryStatus::Unresolved { .. }));
        assert!(audit.config_path.is_none());
    }

    #[tokio::test]
    async fn test_parse_failure_is_per_repository_by_default() {
        let loader = MemoryConfigLoader::new().with_file(path_for("openshift", "oc"), "bogus_key: 1\n");
        let rules = RuleSet::standard().expect("rules");
        let spec = spec();
        let audit = AuditPipeline::audit_repository(
            RepositoryId::new("https://github.com/openshift/oc"),
            &loader,
            &spec.locator(),
            &spec,
            &rules,
        )
        .await
        .expect("audit failed");
        assert!(matches!(audit.status, RepositoryStatus::ParseFailed { .. }));
    }

    #[tokio::test]
    async fn test_parse_failure_is_fatal_in_strict_mode() {
        let loader = MemoryConfigLoader::new().with_file(path_for("openshift", "oc"), "bogus_key: 1\n");
        let rules = RuleSet::standard().expect("rules");
        let spec = spec().strict();
        let err = AuditPipeline::audit_repository(
            RepositoryId::new("https://github.com/openshift/oc"),
            &loader,
            &spec.locator(),
            &spec,
            &rules,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_run_keeps_release_order_with_concurrency() {
        let report_text = "x\nImages:
  NAME  REPO  COMMIT
  a  https://github.com/openshift/a  1
  b  https://github.com/openshift/b  2
  c  https://github.com/openshift/c  3
";
        let source = StaticReleaseInfo::new(report_text);
        let loader = MemoryConfigLoader::new()
            .with_file(path_for("openshift", "a"), COMPLIANT)
            .with_file(path_for("openshift", "c"), COMPLIANT);
        let rules = RuleSet::standard().expect("rules");
        let spec = spec().with_jobs(3);

        let report = AuditPipeline::run(&source, &loader, &spec, &rules)
            .await
            .expect("run failed");

        let order: Vec<&str> = report
            .repositories
            .iter()
            .map(|r| r.repository.as_str())
            .collect();
        assert_eq!(
            order,
            vec![
                "https://github.com/openshift/a",
                "https://github.com/openshift/b",
                "https://github.com/openshift/c",
            ]
        );
        assert_eq!(report.matched_count(), 6);
        assert_eq!(report.repository_error_count(), 1);
        assert_eq!(report.rules_digest, rules.digest());
        assert!(matches!(
            report.repositories[1].status,
            RepositoryStatus::ConfigMissing
        ));
        assert_eq!(
            report.repositories[0].evaluations()[1].verdict,
            Verdict::Matched {
                test: "e2e-aws-serial".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_images_section_aborts_run() {
        let source = StaticReleaseInfo::new("Name: 4.8.0\n");
        let loader = MemoryConfigLoader::new();
        let rules = RuleSet::standard().expect("rules");

        let err = AuditPipeline::run(&source, &loader, &spec(), &rules)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Audit(AuditError::MissingSection)));
    }
}
