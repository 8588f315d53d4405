//! relaudit CI - release coverage audit pipeline
//!
//! Provides an audit orchestrator that:
//! - Fetches the release report from `oc adm release info` (or a file)
//! - Locates and strictly parses each repository's ci-operator configuration
//! - Evaluates the coverage rule set and collects one report per repository
//! - Turns the report into a gate verdict

pub mod fakes;
pub mod gate;
pub mod loader;
pub mod pipeline;
pub mod release_info;
pub mod report;
pub mod spec;

// Re-export key types
pub use gate::{AuditGate, GateVerdict};
pub use loader::{ConfigLoader, FsConfigLoader, LoadError};
pub use pipeline::{AuditPipeline, PipelineError};
pub use release_info::{FileReleaseInfo, ReleaseInfoCommand, ReleaseInfoError, ReleaseInfoSource};
pub use report::{AuditReport, RepositoryAudit, RepositoryStatus};
pub use spec::AuditSpec;
