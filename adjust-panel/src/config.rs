use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_LAYOUT: &str = "testadjustmentpanel.uir";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid panel configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub layout: String,
    pub startup_timeout_ms: u64,
    pub shutdown_warning_ms: u64,
    pub demo_delay_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            layout: DEFAULT_LAYOUT.to_string(),
            startup_timeout_ms: 10_000,
            shutdown_warning_ms: 5_000,
            demo_delay_ms: 500,
        }
    }
}

impl PanelConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn shutdown_warning(&self) -> Duration {
        Duration::from_millis(self.shutdown_warning_ms)
    }

    pub fn demo_delay(&self) -> Duration {
        Duration::from_millis(self.demo_delay_ms)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.layout.trim().is_empty() {
            return Err(ConfigError::Invalid("layout must not be empty".to_string()));
        }
        if self.startup_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "startup_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.shutdown_warning_ms == 0 {
            return Err(ConfigError::Invalid(
                "shutdown_warning_ms must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    /// Reads `.json` files with serde_json and everything else as TOML.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: PanelConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&data)?,
            _ => toml::from_str(&data)?,
        };
        config.validate()
    }
}
