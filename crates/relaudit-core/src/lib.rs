//! relaudit core library
//!
//! The pure half of the release coverage audit:
//! - [`inventory`] turns a release report into the list of contributing repositories
//! - [`locator`] maps a repository and branch to its CI configuration file
//! - [`config`] is the strictly parsed configuration document
//! - [`coverage`] evaluates required test-name rules against a document

pub mod config;
pub mod coverage;
pub mod error;
pub mod inventory;
pub mod locator;
pub mod telemetry;

pub use config::{ConfigMetadata, ReleaseBuildConfiguration, TestStepConfiguration};
pub use coverage::{CoverageRule, RuleEvaluation, RuleSet, Verdict};
pub use error::{AuditError, Result};
pub use inventory::{extract_repositories, RepositoryId, RepositoryList, IMAGES_SECTION_MARKER};
pub use locator::{ConfigLocator, LocatorError, RepoCoordinates, GITHUB_PREFIX};
pub use telemetry::init_tracing;
