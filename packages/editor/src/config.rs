use crate::history::{HistoryConfig, DEFAULT_HISTORY_LIMIT};
use crate::resource_types::{ResourceType, ResourceTypeRegistry};
use ddf_parser::{SchemaError, SchemaSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "ddf.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid schema file: {0}")]
    Schema(#[from] SchemaError),

    #[error("Resource type '{resource_type}' refers to unknown message type '{message}'")]
    UnknownMessage {
        resource_type: String,
        message: String,
    },
}

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Maximum number of undo steps per document (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Schema description file, relative to the config directory
    #[serde(default = "default_schemas")]
    pub schemas: String,

    #[serde(default)]
    pub resource_types: Vec<ResourceTypeConfig>,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_schemas() -> String {
    "schemas.json".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTypeConfig {
    /// Display name
    pub name: String,

    /// File extension, with or without the leading dot
    pub extension: String,

    /// Message type name in the schema file
    pub message: String,
}

impl Config {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = read(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig::with_limit(self.history_limit)
    }

    pub fn schemas_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.schemas)
    }

    /// Load the schema file and register every configured resource type
    pub fn build_registry(&self, dir: &Path) -> Result<ResourceTypeRegistry, ConfigError> {
        let schemas = SchemaSet::from_json(&read(&self.schemas_path(dir))?)?;
        self.registry_from_schemas(&schemas)
    }

    pub fn registry_from_schemas(
        &self,
        schemas: &SchemaSet,
    ) -> Result<ResourceTypeRegistry, ConfigError> {
        let mut registry = ResourceTypeRegistry::new();

        for entry in &self.resource_types {
            let schema =
                schemas
                    .message(&entry.message)
                    .ok_or_else(|| ConfigError::UnknownMessage {
                        resource_type: entry.name.clone(),
                        message: entry.message.clone(),
                    })?;
            registry.register(ResourceType::new(&entry.name, &entry.extension, schema));
        }

        Ok(registry)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            schemas: default_schemas(),
            resource_types: vec![],
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
