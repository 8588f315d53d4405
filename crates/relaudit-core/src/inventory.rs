//! Release inventory extraction.
//!
//! Parses the text printed by `oc adm release info <release> --commits` and
//! returns the repositories that contributed images, in first-seen order.
//!
//! The relevant part of the report looks like:
//!
//! ```text
//! Images:
//!   NAME        REPO                                  COMMIT
//!   cli         https://github.com/openshift/oc       0123abc
//!   installer   https://github.com/openshift/installer 4567def
//! ```
//!
//! Data lines are indented, so splitting on whitespace runs yields a leading
//! empty field and the repository lands at index 2.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::error::{AuditError, Result};

/// Literal marker that opens the images section of a release report.
pub const IMAGES_SECTION_MARKER: &str = "\nImages:\n";

/// Number of fields a data line splits into.
const DATA_LINE_FIELDS: usize = 4;

/// Field index holding the repository URL.
const REPO_FIELD: usize = 2;

fn field_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\s+").expect("static separator pattern is valid"))
}

/// A source repository's canonical web address, e.g.
/// `https://github.com/openshift/installer`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepositoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, duplicate-free list of repositories.
///
/// Order is the order in which repositories first appear in the report.
/// Serializes as a plain sequence; it is only built through [`insert`].
///
/// [`insert`]: RepositoryList::insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryList {
    repos: Vec<RepositoryId>,
    seen: HashSet<RepositoryId>,
}

impl Serialize for RepositoryList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.repos)
    }
}

impl RepositoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `repo` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, repo: RepositoryId) -> bool {
        if !self.seen.insert(repo.clone()) {
            return false;
        }
        self.repos.push(repo);
        true
    }

    pub fn contains(&self, repo: &RepositoryId) -> bool {
        self.seen.contains(repo)
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RepositoryId> {
        self.repos.iter()
    }

    pub fn as_slice(&self) -> &[RepositoryId] {
        &self.repos
    }

    pub fn into_vec(self) -> Vec<RepositoryId> {
        self.repos
    }
}

impl IntoIterator for RepositoryList {
    type Item = RepositoryId;
    type IntoIter = std::vec::IntoIter<RepositoryId>;

    fn into_iter(self) -> Self::IntoIter {
        self.repos.into_iter()
    }
}

impl<'a> IntoIterator for &'a RepositoryList {
    type Item = &'a RepositoryId;
    type IntoIter = std::slice::Iter<'a, RepositoryId>;

    fn into_iter(self) -> Self::IntoIter {
        self.repos.iter()
    }
}

/// Extract the contributing repositories from a release report.
///
/// Fails with [`AuditError::MissingSection`] when the report has no images
/// section. An images section with no data lines yields an empty list.
///
/// Scanning skips the column header line, stops at the first empty line and
/// ignores lines that do not split into exactly four fields. A line holding
/// only whitespace is not empty: it is skipped like any other odd line.
pub fn extract_repositories(report: &str) -> Result<RepositoryList> {
    let start = report
        .find(IMAGES_SECTION_MARKER)
        .ok_or(AuditError::MissingSection)?;
    let section = &report[start + IMAGES_SECTION_MARKER.len()..];

    let mut repos = RepositoryList::new();

    for line in section.split('\n').skip(1) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            break;
        }

        let fields: Vec<&str> = field_separator().split(line).collect();
        if fields.len() != DATA_LINE_FIELDS {
            debug!(fields = fields.len(), line, "skipping release report line");
            continue;
        }

        repos.insert(RepositoryId::new(fields[REPO_FIELD]));
    }

    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "Name:      4.8.0-fc.9
Digest:    sha256:0123

Images:
  NAME                  REPO                                       COMMIT
  cli                   https://github.com/openshift/oc            aaaaaaa
  installer             https://github.com/openshift/installer     bbbbbbb
  installer-artifacts   https://github.com/openshift/installer     bbbbbbb
  tests                 https://github.com/openshift/origin        ccccccc

Trailing section that must be ignored:
  foo                   https://github.com/openshift/ignored       ddddddd
";

    fn urls(list: &RepositoryList) -> Vec<&str> {
        list.iter().map(RepositoryId::as_str).collect()
    }

    #[test]
    fn test_extracts_repositories_in_first_seen_order() {
        let repos = extract_repositories(REPORT).expect("extract failed");
        assert_eq!(
            urls(&repos),
            vec![
                "https://github.com/openshift/oc",
                "https://github.com/openshift/installer",
                "https://github.com/openshift/origin",
            ]
        );
    }

    #[test]
    fn test_missing_section_is_error() {
        let err = extract_repositories("Name: 4.8.0\nDigest: sha256:0123\n").unwrap_err();
        assert!(matches!(err, AuditError::MissingSection));
    }

    #[test]
    fn test_marker_requires_leading_newline() {
        let err = extract_repositories("Images:\n  NAME REPO COMMIT\n").unwrap_err();
        assert!(matches!(err, AuditError::MissingSection));
    }

    #[test]
    fn test_empty_section_yields_empty_list() {
        let report = "Name: x\nImages:\n  NAME  REPO  COMMIT\n\n";
        let repos = extract_repositories(report).expect("extract failed");
        assert!(repos.is_empty());
    }

    #[test]
    fn test_header_is_skipped_even_when_four_fields() {
        let report = "x\nImages:\n  NAME REPO COMMIT\n";
        let repos = extract_repositories(report).expect("extract failed");
        assert!(repos.is_empty());
    }

    #[test]
    fn test_lines_with_wrong_field_count_are_skipped() {
        let report = "x\nImages:
  NAME  REPO  COMMIT
  short  https://github.com/openshift/short
  cli  https://github.com/openshift/oc  aaaaaaa
  too  many  https://github.com/openshift/long  fields  here
  api  https://github.com/openshift/api  bbbbbbb
";
        let repos = extract_repositories(report).expect("extract failed");
        assert_eq!(
            urls(&repos),
            vec!["https://github.com/openshift/oc", "https://github.com/openshift/api"]
        );
    }

    #[test]
    fn test_blank_line_terminates_scan() {
        let report = "x\nImages:
  NAME  REPO  COMMIT
  cli  https://github.com/openshift/oc  aaaaaaa

  api  https://github.com/openshift/api  bbbbbbb
";
        let repos = extract_repositories(report).expect("extract failed");
        assert_eq!(urls(&repos), vec!["https://github.com/openshift/oc"]);
    }

    #[test]
    fn test_whitespace_only_line_does_not_end_section() {
        let report = "x\nImages:\n  NAME  REPO  COMMIT\n  a  https://github.com/o/a  1\n   \n  b  https://github.com/o/b  2\n\n";
        let repos = extract_repositories(report).expect("extract failed");
        assert_eq!(
            urls(&repos),
            vec!["https://github.com/o/a", "https://github.com/o/b"]
        );
    }

    #[test]
    fn test_crlf_line_endings_are_tolerated() {
        let report = "x\nImages:\n  NAME  REPO  COMMIT\r\n  cli  https://github.com/openshift/oc  aaaaaaa\r\n\r\n";
        let repos = extract_repositories(report).expect("extract failed");
        assert_eq!(urls(&repos), vec!["https://github.com/openshift/oc"]);
    }

    #[test]
    fn test_repository_list_insert_deduplicates() {
        let mut list = RepositoryList::new();
        assert!(list.insert(RepositoryId::new("a")));
        assert!(list.insert(RepositoryId::new("b")));
        assert!(!list.insert(RepositoryId::new("a")));
        assert_eq!(list.len(), 2);
        assert!(list.contains(&RepositoryId::new("b")));
        assert!(!list.contains(&RepositoryId::new("c")));
    }

    #[test]
    fn test_repository_list_serializes_as_sequence() {
        let mut list = RepositoryList::new();
        list.insert(RepositoryId::new("https://github.com/o/a"));
        list.insert(RepositoryId::new("https://github.com/o/b"));
        assert_eq!(
            serde_yaml::to_string(&list).expect("serialize"),
            "- https://github.com/o/a\n- https://github.com/o/b\n"
        );
    }
}
