//! Audit gate evaluation for pass/fail criteria.

use serde::{Deserialize, Serialize};

use crate::report::AuditReport;

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// Violations that caused failure (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Audit gate rules.
pub struct AuditGate;

impl AuditGate {
    /// Evaluate whether the audited release is fully covered.
    ///
    /// Gate rule:
    /// - Every repository must have been located, loaded and parsed
    /// - Every rule evaluation must have matched exactly one test
    pub fn evaluate(report: &AuditReport) -> GateVerdict {
        let mut violations = Vec::new();

        for audit in &report.repositories {
            if audit.is_repository_error() {
                violations.extend(audit.diagnostic_lines());
                continue;
            }
            for evaluation in audit.evaluations().iter().filter(|e| e.is_violation()) {
                violations.push(format!("{}: {}", audit.repository, evaluation));
            }
        }

        let passed = violations.is_empty();
        let message = if passed {
            format!(
                "All {} repositories cover every rule",
                report.repositories.len()
            )
        } else {
            format!("Gate failed with {} violation(s)", violations.len())
        };

        GateVerdict {
            passed,
            violations,
            message,
        }
    }
}
