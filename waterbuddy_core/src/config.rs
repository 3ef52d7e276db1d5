//! Configuration file support for WaterBuddy.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/waterbuddy/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub intake: IntakeConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Quick-log button amounts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Logged by `log` with no amount
    #[serde(default = "default_quick_amount_ml")]
    pub quick_amount_ml: i64,

    #[serde(default = "default_quick_amounts")]
    pub quick_amounts: Vec<i64>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            quick_amount_ml: default_quick_amount_ml(),
            quick_amounts: default_quick_amounts(),
        }
    }
}

/// Status and weekly summary layout
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_history_entries")]
    pub history_entries: usize,

    /// Width of the longest bar in the weekly chart
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            history_entries: default_history_entries(),
            chart_width: default_chart_width(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("waterbuddy")
}

fn default_quick_amount_ml() -> i64 {
    250
}

fn default_quick_amounts() -> Vec<i64> {
    vec![100, 150, 250, 500]
}

fn default_history_entries() -> usize {
    8
}

fn default_chart_width() -> usize {
    30
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("waterbuddy").join("config.toml")
    }

    /// Reject values the front-ends cannot use
    pub fn validate(&self) -> Result<()> {
        if self.intake.quick_amount_ml <= 0 {
            return Err(Error::Config(format!(
                "quick_amount_ml must be positive, got {}",
                self.intake.quick_amount_ml
            )));
        }
        if let Some(bad) = self.intake.quick_amounts.iter().find(|a| **a <= 0) {
            return Err(Error::Config(format!(
                "quick_amounts must be positive, got {}",
                bad
            )));
        }
        if self.display.chart_width == 0 {
            return Err(Error::Config("chart_width must be at least 1".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
