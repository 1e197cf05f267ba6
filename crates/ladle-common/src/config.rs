use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Tunables for the mention composer.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ComposerConfig {
    /// Scheme of canonical references (`nostr` in `nostr:npub1...`).
    pub scheme: SmolStr,
    /// Identifier prefixes accepted as mentions.
    pub identifier_prefixes: Vec<SmolStr>,
    /// Delay after the last keystroke before a network search runs.
    pub debounce_ms: u64,
    /// Max rows in the dropdown.
    pub suggestion_limit: usize,
    /// Profiles resolved per request during follow-list preload.
    pub preload_batch_size: usize,
    /// Minimum query length before the directory provider is consulted.
    pub directory_min_query_len: usize,
    /// Insert a space after an accepted mention.
    pub trailing_space: bool,
    /// Leading chars kept when shortening an unresolved identifier.
    pub shorten_head: usize,
    /// Trailing chars kept when shortening an unresolved identifier.
    pub shorten_tail: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            scheme: SmolStr::new_static("nostr"),
            identifier_prefixes: vec![
                SmolStr::new_static("npub"),
                SmolStr::new_static("nprofile"),
            ],
            debounce_ms: 300,
            suggestion_limit: 10,
            preload_batch_size: 100,
            directory_min_query_len: 2,
            trailing_space: true,
            shorten_head: 12,
            shorten_tail: 6,
        }
    }
}

impl ComposerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Load from a `.toml` or `.json` file, picked by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&read()?)?,
            Some("json") => Self::from_json_str(&read()?)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ));
            }
        };
        tracing::debug!(path = %path.display(), "loaded composer config");
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheme.is_empty() || self.scheme.contains(':') {
            return Err(ConfigError::Invalid {
                field: "scheme",
                reason: "must be non-empty and must not contain ':'".into(),
            });
        }
        if self.identifier_prefixes.is_empty() {
            return Err(ConfigError::Invalid {
                field: "identifier_prefixes",
                reason: "at least one prefix is required".into(),
            });
        }
        if self.preload_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "preload_batch_size",
                reason: "must be greater than zero".into(),
            });
        }
        if self.suggestion_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "suggestion_limit",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
