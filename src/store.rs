//! Key/value storage for JSON configuration documents

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{CleanerError, Result};

/// Store for configuration objects keyed by name (e.g. `keywords.json`)
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a configuration object; `None` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a configuration object, replacing any previous value
    async fn put(&self, key: &str, value: &Value) -> Result<()>;
}

/// Stores each key as a JSON file in a configuration directory
#[derive(Debug, Clone)]
pub struct FileSystemConfigStore {
    config_dir: PathBuf,
}

impl FileSystemConfigStore {
    /// Open a store over an existing directory
    pub fn new(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();
        if !config_dir.is_dir() {
            return Err(CleanerError::ConfigError(format!(
                "Invalid config directory path: {}",
                config_dir.display()
            )));
        }

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the file backing `key`
    pub fn path(&self, key: &str) -> PathBuf {
        self.config_dir.join(key)
    }
}

#[async_trait]
impl ConfigStore for FileSystemConfigStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path(key);
        if !path.exists() {
            tracing::debug!("Config key {} not found at {:?}", key, path);
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let value = serde_json::from_str(&content).map_err(|e| {
            CleanerError::ConfigError(format!("Failed to parse {}: {}", key, e))
        })?;
        Ok(Some(value))
    }

    async fn put(&self, key: &str, value: &Value) -> Result<()> {
        let content = serde_json::to_string(value)?;
        tokio::fs::write(self.path(key), content).await?;
        tracing::debug!("Saved config key {}", key);
        Ok(())
    }
}
