//! In-memory fakes for the pipeline collaborators (testing only)
//!
//! Provides `StaticReleaseInfo` and `MemoryConfigLoader` so the pipeline can
//! be exercised without `oc` or a checkout of the release repository.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::loader::{ConfigLoader, LoadError};
use crate::release_info::{ReleaseInfoError, ReleaseInfoSource};

// ---------------------------------------------------------------------------
// StaticReleaseInfo
// ---------------------------------------------------------------------------

/// Release source that always returns the same report text.
#[derive(Debug, Clone)]
pub struct StaticReleaseInfo {
    text: String,
}

impl StaticReleaseInfo {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ReleaseInfoSource for StaticReleaseInfo {
    fn describe(&self) -> String {
        "static report".to_string()
    }

    async fn fetch(&self) -> Result<String, ReleaseInfoError> {
        Ok(self.text.clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryConfigLoader
// ---------------------------------------------------------------------------

/// Configuration loader backed by a `HashMap<path, bytes>`.
///
/// Records every requested path so tests can assert on lookups.
#[derive(Debug, Default)]
pub struct MemoryConfigLoader {
    files: HashMap<PathBuf, Vec<u8>>,
    requested: Mutex<Vec<PathBuf>>,
}

impl MemoryConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) -> Self {
        self.files.insert(path.into(), contents.as_ref().to_vec());
        self
    }

    /// Paths passed to [`ConfigLoader::load`], in call order.
    pub fn requested(&self) -> Vec<PathBuf> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigLoader for MemoryConfigLoader {
    async fn load(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        self.requested.lock().unwrap().push(path.to_path_buf());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }
}
