//! Audit results.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use relaudit_core::{RepositoryId, RuleEvaluation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened when auditing one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoryStatus {
    /// Configuration parsed; one evaluation per rule.
    Evaluated { evaluations: Vec<RuleEvaluation> },

    /// The repository URL could not be mapped to a configuration path.
    Unresolved { reason: String },

    /// No configuration file at the computed path.
    ConfigMissing,

    /// The file exists but could not be read.
    LoadFailed { error: String },

    /// The file could not be parsed strictly.
    ParseFailed { error: String },
}

/// Audit result for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAudit {
    pub repository: RepositoryId,

    /// Computed configuration path, when the locator resolved one.
    pub config_path: Option<PathBuf>,

    #[serde(flatten)]
    pub status: RepositoryStatus,
}

impl RepositoryAudit {
    /// Rule evaluations, empty unless the configuration was evaluated.
    pub fn evaluations(&self) -> &[RuleEvaluation] {
        match &self.status {
            RepositoryStatus::Evaluated { evaluations } => evaluations,
            _ => &[],
        }
    }

    /// Whether the repository failed before rules could be evaluated.
    pub fn is_repository_error(&self) -> bool {
        !matches!(self.status, RepositoryStatus::Evaluated { .. })
    }

    pub fn violation_count(&self) -> usize {
        self.evaluations().iter().filter(|e| e.is_violation()).count()
    }

    /// One diagnostic line per repository failure or per rule evaluation.
    pub fn diagnostic_lines(&self) -> Vec<String> {
        let repo = &self.repository;
        match &self.status {
            RepositoryStatus::Evaluated { evaluations } => evaluations
                .iter()
                .map(|e| format!("{}: {}", repo, e))
                .collect(),
            RepositoryStatus::Unresolved { reason } => {
                vec![format!("{}: cannot locate configuration: {}", repo, reason)]
            }
            RepositoryStatus::ConfigMissing => vec![format!(
                "{}: configuration file not found: {}",
                repo,
                self.path_display()
            )],
            RepositoryStatus::LoadFailed { error } => vec![format!(
                "{}: failed to read {}: {}",
                repo,
                self.path_display(),
                error
            )],
            RepositoryStatus::ParseFailed { error } => vec![format!(
                "{}: failed to parse {}: {}",
                repo,
                self.path_display(),
                error
            )],
        }
    }

    fn path_display(&self) -> String {
        self.config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

/// Result of a complete audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Unique identifier of this run.
    pub audit_id: Uuid,

    pub release: String,

    pub branch: String,

    /// Digest of the ordered rule patterns.
    pub rules_digest: String,

    pub started_at: DateTime<Utc>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    /// Per-repository results in release order.
    pub repositories: Vec<RepositoryAudit>,
}

impl AuditReport {
    /// Number of rule evaluations that found exactly one test.
    pub fn matched_count(&self) -> usize {
        self.repositories
            .iter()
            .flat_map(|r| r.evaluations())
            .filter(|e| !e.is_violation())
            .count()
    }

    /// Number of NotFound / Ambiguous evaluations.
    pub fn violation_count(&self) -> usize {
        self.repositories.iter().map(|r| r.violation_count()).sum()
    }

    /// Number of repositories that could not be evaluated.
    pub fn repository_error_count(&self) -> usize {
        self.repositories
            .iter()
            .filter(|r| r.is_repository_error())
            .count()
    }

    /// Whether every repository was evaluated without violations.
    pub fn is_clean(&self) -> bool {
        self.violation_count() == 0 && self.repository_error_count() == 0
    }

    pub fn diagnostic_lines(&self) -> Vec<String> {
        self.repositories
            .iter()
            .flat_map(|r| r.diagnostic_lines())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaudit_core::Verdict;

    fn evaluation(rule: &str, verdict: Verdict) -> RuleEvaluation {
        RuleEvaluation {
            rule: rule.to_string(),
            pattern: format!("^{}$", rule),
            verdict,
        }
    }

    fn report(repositories: Vec<RepositoryAudit>) -> AuditReport {
        AuditReport {
            audit_id: Uuid::new_v4(),
            release: "4.8.0-fc.9".to_string(),
            branch: "master".to_string(),
            rules_digest: "abc123".to_string(),
            started_at: Utc::now(),
            duration_ms: 10,
            repositories,
        }
    }

    #[test]
    fn test_report_counts() {
        let report = report(vec![
            RepositoryAudit {
                repository: RepositoryId::new("https://github.com/openshift/oc"),
                config_path: Some(PathBuf::from("oc.yaml")),
                status: RepositoryStatus::Evaluated {
                    evaluations: vec![
                        evaluation("e2e", Verdict::Matched { test: "e2e-aws".to_string() }),
                        evaluation("serial", Verdict::NotFound),
                        evaluation(
                            "upgrade",
                            Verdict::Ambiguous {
                                tests: vec!["a".to_string(), "b".to_string()],
                            },
                        ),
                    ],
                },
            },
            RepositoryAudit {
                repository: RepositoryId::new("https://github.com/openshift/api"),
                config_path: Some(PathBuf::from("api.yaml")),
                status: RepositoryStatus::ConfigMissing,
            },
        ]);

        assert_eq!(report.matched_count(), 1);
        assert_eq!(report.violation_count(), 2);
        assert_eq!(report.repository_error_count(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.diagnostic_lines().len(), 4);
    }

    #[test]
    fn test_diagnostic_lines_name_repository() {
        let audit = RepositoryAudit {
            repository: RepositoryId::new("https://github.com/openshift/api"),
            config_path: Some(PathBuf::from("/r/api.yaml")),
            status: RepositoryStatus::ConfigMissing,
        };
        assert_eq!(
            audit.diagnostic_lines(),
            vec!["https://github.com/openshift/api: configuration file not found: /r/api.yaml"]
        );

        let audit = RepositoryAudit {
            repository: RepositoryId::new("https://example.com/x"),
            config_path: None,
            status: RepositoryStatus::Unresolved {
                reason: "not hosted".to_string(),
            },
        };
        assert_eq!(
            audit.diagnostic_lines(),
            vec!["https://example.com/x: cannot locate configuration: not hosted"]
        );
    }

    #[test]
    fn test_empty_report_is_clean() {
        let report = report(vec![]);
        assert!(report.is_clean());
        assert_eq!(report.matched_count(), 0);
    }

    #[test]
    fn test_report_serializes_status_tag() {
        let report = report(vec![RepositoryAudit {
            repository: RepositoryId::new("https://github.com/openshift/oc"),
            config_path: None,
            status: RepositoryStatus::ConfigMissing,
        }]);
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["repositories"][0]["status"], "config_missing");
        assert_eq!(json["repositories"][0]["repository"], "https://github.com/openshift/oc");
    }
}
