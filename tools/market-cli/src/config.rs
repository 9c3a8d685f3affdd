//! CLI configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use market_cart::CartConfig;
use serde::{Deserialize, Serialize};

/// File names searched for, in order, from the working directory upwards.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["market.toml", ".market.toml", "market.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where the cart snapshot is stored.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Cart store settings.
    #[serde(default)]
    pub cart: CartConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: CliConfig = if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))?
        };

        config
            .cart
            .validate()
            .with_context(|| format!("Invalid config file: {}", path))?;
        Ok(config)
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }
}

/// Storage location settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the key-value files. Relative paths resolve against
    /// the working directory; unset means the per-user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Get the per-user data directory for the cart.
pub fn default_data_dir() -> PathBuf {
    let base = if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        PathBuf::from("/tmp")
    };
    base.join("market").join("store")
}
