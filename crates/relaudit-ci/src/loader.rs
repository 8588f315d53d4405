//! Configuration byte retrieval.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

/// Errors while reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("configuration file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads the raw bytes of a configuration file.
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Vec<u8>, LoadError>;
}

/// Loads configuration files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsConfigLoader;

#[async_trait]
impl ConfigLoader for FsConfigLoader {
    async fn load(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "loaded configuration");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LoadError::NotFound(path.to_path_buf())),
            Err(source) => Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
