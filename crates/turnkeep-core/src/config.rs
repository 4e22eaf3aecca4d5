//! History layer configuration.
//!
//! Loaded from an optional JSON file:
//!
//! ```json
//! { "sdkVersion": "ai@v5", "maxPayloadBytes": 1000000 }
//! ```
//!
//! Missing keys take their defaults, and a missing file yields the defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::types::AI_MESSAGES_SDK_VERSION;

/// Default ceiling for a serialized envelope, in bytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings shared by the envelope parser and the persistence guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// The only envelope version tag that is trusted on read and written on save.
    pub sdk_version: String,

    /// Largest serialized envelope (inclusive) the guard will accept.
    pub max_payload_bytes: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            sdk_version: AI_MESSAGES_SDK_VERSION.to_string(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sdk_version.trim().is_empty() {
            return Err(ConfigError::Invalid("sdkVersion must not be empty".to_string()));
        }
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "maxPayloadBytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load config from `path`, falling back to defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<HistoryConfig, ConfigError> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(HistoryConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: HistoryConfig = serde_json::from_str(&contents)?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("history.json")).unwrap();

        assert_eq!(config, HistoryConfig::default());
        assert_eq!(config.sdk_version, "ai@v5");
        assert_eq!(config.max_payload_bytes, 1_000_000);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, r#"{ "maxPayloadBytes": 4096 }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.max_payload_bytes, 4096);
        assert_eq!(config.sdk_version, AI_MESSAGES_SDK_VERSION);
    }

    #[test]
    fn zero_ceiling_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, r#"{ "maxPayloadBytes": 0 }"#).unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn empty_version_is_invalid() {
        let config = HistoryConfig {
            sdk_version: "  ".to_string(),
            ..HistoryConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
