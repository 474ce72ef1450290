//! Effective configuration with provenance
//!
//! Captures the merged settings plus the list of layers that contributed.

use chrono::{DateTime, Utc};
use globset::Glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::defaults::EngineConfig;
use super::merge::merge_layers;

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "confpatch/effective_config@1";

/// Config file looked up in the document root when none is given.
pub const CONFIG_FILE_NAME: &str = "confpatch.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged, validated settings
    pub config: EngineConfig,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build from builtin defaults, an optional TOML file, and CLI overrides.
    ///
    /// A file path that does not exist is skipped.
    pub fn build(file: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![EngineConfig::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        }];

        if let Some(path) = file {
            if path.exists() {
                layers.push(Self::load_toml_file(path)?);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::File,
                    path: Some(path.to_string_lossy().to_string()),
                });
            }
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        let merged = merge_layers(layers);
        let config: EngineConfig = serde_json::from_value(merged)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Self::validate_config(&config)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config,
            sources,
        })
    }

    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
        Ok(Self::toml_to_json(toml_value))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => Value::Array(arr.into_iter().map(Self::toml_to_json).collect()),
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
        if config.max_patch_loop_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_patch_loop_iterations must be at least 1".to_string(),
            ));
        }
        if config.include.is_empty() {
            return Err(ConfigError::ValidationError(
                "include must name at least one pattern".to_string(),
            ));
        }
        for pattern in &config.include {
            Glob::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid include pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },
}
