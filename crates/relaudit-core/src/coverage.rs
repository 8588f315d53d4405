//! Coverage rules and their evaluation.
//!
//! A [`CoverageRule`] requires that exactly one test in a configuration has a
//! name matching its pattern. Rules are data: the standard set lives in
//! [`STANDARD_RULES`] and callers can append their own patterns.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::ReleaseBuildConfiguration;
use crate::error::{AuditError, Result};

/// Standard rules as `(label, pattern)`: platform e2e, serial e2e, upgrade e2e.
pub const STANDARD_RULES: [(&str, &str); 3] = [
    ("e2e", r"^e2e-(?:aws|gcp|agnostic)$"),
    ("serial", r"^e2e-(?:[a-z]+-)?serial$"),
    ("upgrade", r"^e2e-(?:[a-z]+-)?upgrade$"),
];

/// A required test-name pattern that must match exactly one test.
#[derive(Debug, Clone)]
pub struct CoverageRule {
    label: String,
    pattern: Regex,
}

impl CoverageRule {
    /// Compile a rule. Matching is unanchored unless the pattern anchors itself.
    pub fn new(label: impl Into<String>, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| AuditError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            label: label.into(),
            pattern,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Classify `config` against this rule. Never fails.
    pub fn evaluate(&self, config: &ReleaseBuildConfiguration) -> RuleEvaluation {
        let mut matched: Vec<String> = config
            .test_names()
            .filter(|name| self.pattern.is_match(name))
            .map(str::to_string)
            .collect();

        let verdict = match matched.len() {
            0 => Verdict::NotFound,
            1 => Verdict::Matched {
                test: matched.remove(0),
            },
            _ => Verdict::Ambiguous { tests: matched },
        };

        RuleEvaluation {
            rule: self.label.clone(),
            pattern: self.pattern().to_string(),
            verdict,
        }
    }
}

/// Outcome of one rule against one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Exactly one test matched.
    Matched { test: String },
    /// No test matched.
    NotFound,
    /// More than one test matched.
    Ambiguous { tests: Vec<String> },
}

/// A rule's verdict together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub rule: String,
    pub pattern: String,
    pub verdict: Verdict,
}

impl RuleEvaluation {
    pub fn is_violation(&self) -> bool {
        !matches!(self.verdict, Verdict::Matched { .. })
    }

    /// The single matched test, if any.
    pub fn matched_test(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Matched { test } => Some(test),
            _ => None,
        }
    }
}

impl fmt::Display for RuleEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Verdict::Matched { test } => write!(f, "found {}", test),
            Verdict::NotFound => write!(f, "no tests found for {}", self.pattern),
            Verdict::Ambiguous { tests } => write!(
                f,
                "found {} tests for {}: [{}]",
                tests.len(),
                self.pattern,
                tests.join(" ")
            ),
        }
    }
}

/// Ordered collection of coverage rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CoverageRule>,
}

impl RuleSet {
    /// Build a rule set from compiled rules. An empty set is rejected.
    pub fn new(rules: Vec<CoverageRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(AuditError::EmptyRuleSet);
        }
        Ok(Self { rules })
    }

    /// The three standard e2e rules.
    pub fn standard() -> Result<Self> {
        Self::from_labeled(STANDARD_RULES.iter().copied())
    }

    /// Compile rules from `(label, pattern)` pairs.
    pub fn from_labeled<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let rules = pairs
            .into_iter()
            .map(|(label, pattern)| CoverageRule::new(label, pattern))
            .collect::<Result<Vec<_>>>()?;
        Self::new(rules)
    }

    /// Build the active rule set: optionally the standard rules, then `extra`
    /// patterns labelled by the pattern itself.
    pub fn with_extra(include_standard: bool, extra: &[String]) -> Result<Self> {
        let mut rules = Vec::new();
        if include_standard {
            for (label, pattern) in STANDARD_RULES {
                rules.push(CoverageRule::new(label, pattern)?);
            }
        }
        for pattern in extra {
            rules.push(CoverageRule::new(pattern.as_str(), pattern)?);
        }
        Self::new(rules)
    }

    pub fn rules(&self) -> &[CoverageRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule independently; one evaluation per rule, in order.
    pub fn evaluate(&self, repo: &str, config: &ReleaseBuildConfiguration) -> Vec<RuleEvaluation> {
        self.rules
            .iter()
            .map(|rule| {
                let evaluation = rule.evaluate(config);
                match &evaluation.verdict {
                    Verdict::Matched { test } => {
                        info!(repo, rule = rule.label(), test = %test, "coverage rule matched");
                    }
                    Verdict::NotFound => {
                        warn!(repo, rule = rule.label(), pattern = rule.pattern(), "no test matches coverage rule");
                    }
                    Verdict::Ambiguous { tests } => {
                        warn!(repo, rule = rule.label(), pattern = rule.pattern(), ?tests, "multiple tests match coverage rule");
                    }
                }
                evaluation
            })
            .collect()
    }

    /// SHA-256 hex digest of the ordered patterns.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for rule in &self.rules {
            hasher.update(rule.pattern().as_bytes());
            hasher.update(b"\0");
        }
        let digest = hex::encode(hasher.finalize());
        debug!(rules = self.rules.len(), digest = %digest, "computed rule set digest");
        digest
    }
}
