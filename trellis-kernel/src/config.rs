//! Inflater configuration.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable that forces verbose diagnostics on (`1`/`true`) or off.
pub const VERBOSE_ENV: &str = "TRELLIS_VERBOSE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runtime switches for the inflation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InflaterConfig {
    /// Log every handled attribute and every rejected attribute.
    pub verbose: bool,
}

impl InflaterConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply overrides from the environment.
    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(VERBOSE_ENV).ok();
        self.with_verbose_override(value.as_deref())
    }

    fn with_verbose_override(mut self, value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("1" | "true" | "yes" | "on") => self.verbose = true,
            Some("0" | "false" | "no" | "off") => self.verbose = false,
            Some(other) => tracing::warn!("ignoring {}={:?}", VERBOSE_ENV, other),
            None => {}
        }
        self
    }
}
