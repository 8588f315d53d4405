//! Release report acquisition.
//!
//! The report normally comes from `oc adm release info <release> --commits`;
//! [`FileReleaseInfo`] reads a previously captured report instead.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors while obtaining the release report.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseInfoError {
    #[error("release info command is empty")]
    EmptyCommand,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout_secs} seconds")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("{program} exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to collect output of {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read release report {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something that yields the raw text of a release report.
#[async_trait]
pub trait ReleaseInfoSource: Send + Sync {
    /// Human-readable description used in logs.
    fn describe(&self) -> String;

    /// Fetch the report text.
    async fn fetch(&self) -> Result<String, ReleaseInfoError>;
}

/// Runs the release inspection tool and captures its stdout.
#[derive(Debug, Clone)]
pub struct ReleaseInfoCommand {
    /// Command to execute (first element is the executable).
    pub command: Vec<String>,

    /// Timeout in seconds; 0 disables the timeout.
    pub timeout_secs: u64,
}

impl ReleaseInfoCommand {
    /// `<tool> adm release info <release> --commits`.
    pub fn for_release(tool: &str, release: &str, timeout_secs: u64) -> Self {
        Self {
            command: vec![
                tool.to_string(),
                "adm".to_string(),
                "release".to_string(),
                "info".to_string(),
                release.to_string(),
                "--commits".to_string(),
            ],
            timeout_secs,
        }
    }

    /// Run an arbitrary command.
    pub fn custom(command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            command,
            timeout_secs,
        }
    }
}

#[async_trait]
impl ReleaseInfoSource for ReleaseInfoCommand {
    fn describe(&self) -> String {
        self.command.join(" ")
    }

    async fn fetch(&self) -> Result<String, ReleaseInfoError> {
        let start = Instant::now();

        let (exe, args) = self
            .command
            .split_first()
            .ok_or(ReleaseInfoError::EmptyCommand)?;

        let child = Command::new(exe)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ReleaseInfoError::Spawn {
                program: exe.clone(),
                source,
            })?;

        let waited = if self.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| ReleaseInfoError::Timeout {
                program: exe.clone(),
                timeout_secs: self.timeout_secs,
            })?
        } else {
            child.wait_with_output().await
        };
        let output = waited.map_err(|source| ReleaseInfoError::Wait {
            program: exe.clone(),
            source,
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(program = %exe, duration_ms, "release info command finished");

        if !output.status.success() {
            return Err(ReleaseInfoError::NonZeroExit {
                program: exe.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        info!(program = %exe, bytes = stdout.len(), "fetched release report");
        Ok(stdout)
    }
}

/// Reads a release report captured to disk.
#[derive(Debug, Clone)]
pub struct FileReleaseInfo {
    pub path: PathBuf,
}

impl FileReleaseInfo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReleaseInfoSource for FileReleaseInfo {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch(&self) -> Result<String, ReleaseInfoError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ReleaseInfoError::Read {
                path: self.path.clone(),
                source,
            })?;
        info!(path = %self.path.display(), bytes = text.len(), "read release report");
        Ok(text)
    }
}
