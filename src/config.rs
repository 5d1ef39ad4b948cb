use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{CleanerError, Result};
use crate::rules::{TrashKeyword, WILDCARD};
use crate::store::ConfigStore;

/// Store key of the keyword list
pub const FILE_KEYWORDS: &str = "keywords.json";
/// Application settings file inside the config directory
pub const FILE_CONFIG: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub dry_run: bool,
}

fn default_max_concurrent() -> usize {
    40
}

fn default_max_retries() -> u32 {
    3
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CleanerError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            CleanerError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CleanerError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            CleanerError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| CleanerError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // 1-50 keeps message fetches under the Gmail per-user quota
        if self.client.max_concurrent_requests == 0 {
            return Err(CleanerError::ConfigError(
                "client.max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if self.client.max_concurrent_requests > 50 {
            return Err(CleanerError::ConfigError(
                "client.max_concurrent_requests cannot exceed 50".to_string(),
            ));
        }

        if self.client.max_retries > 10 {
            return Err(CleanerError::ConfigError(
                "client.max_retries cannot exceed 10".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        Self::default().save(path).await
    }
}

/// A field or label list: either a comma-delimited string or a JSON array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordList {
    Delimited(String),
    List(Vec<String>),
}

impl KeywordList {
    /// Split on commas, trim, and drop empty pieces
    pub fn to_vec(&self) -> Vec<String> {
        let pieces: Box<dyn Iterator<Item = &str>> = match self {
            KeywordList::Delimited(s) => Box::new(s.split(',')),
            KeywordList::List(items) => Box::new(items.iter().flat_map(|item| item.split(','))),
        };

        pieces
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for KeywordList {
    fn default() -> Self {
        KeywordList::Delimited(WILDCARD.to_string())
    }
}

/// One keyword record as written in `keywords.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub value: String,
    #[serde(default)]
    pub fields: KeywordList,
    #[serde(default)]
    pub labels: KeywordList,
}

impl KeywordEntry {
    pub fn into_keyword(self) -> Result<TrashKeyword> {
        TrashKeyword::new(self.value, self.fields.to_vec(), self.labels.to_vec())
    }
}

/// Parse a keyword document into validated keywords
pub fn parse_keywords(document: Value) -> Result<Vec<TrashKeyword>> {
    let entries = match document {
        Value::Array(entries) => entries,
        other => {
            return Err(CleanerError::ConfigError(format!(
                "{} must contain a JSON array of keywords, found {}",
                FILE_KEYWORDS,
                json_type_name(&other)
            )))
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let entry: KeywordEntry = serde_json::from_value(entry).map_err(|e| {
                CleanerError::InvalidKeyword(format!("keyword #{}: {}", index + 1, e))
            })?;
            entry.into_keyword().map_err(|e| match e {
                CleanerError::InvalidKeyword(msg) => {
                    CleanerError::InvalidKeyword(format!("keyword #{}: {}", index + 1, msg))
                }
                other => other,
            })
        })
        .collect()
}

/// Read and validate the keyword list from the store
pub async fn load_keywords(store: &dyn ConfigStore) -> Result<Vec<TrashKeyword>> {
    let document = store.get(FILE_KEYWORDS).await?.ok_or_else(|| {
        CleanerError::ConfigError(format!(
            "{} not found in the config directory",
            FILE_KEYWORDS
        ))
    })?;

    let keywords = parse_keywords(document)?;
    tracing::info!("Loaded {} trash keywords", keywords.len());
    Ok(keywords)
}

/// Keyword list written by `init-config`
pub fn example_keywords() -> Value {
    serde_json::json!([
        {
            "value": "unsubscribe|newsletter",
            "fields": "body,snippet",
            "labels": "category_promotions,category_updates"
        },
        { "value": "viagra|lottery|bitcoin", "fields": "*", "labels": "spam" },
        { "value": "noreply@", "fields": "from", "labels": "*" }
    ])
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
