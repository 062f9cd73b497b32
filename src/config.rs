use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::frames::FrameSettings;
use crate::logging::LogConfig;
use crate::pipeline::OutputSettings;
use crate::render::ChartStyle;
use crate::trend::TrendSettings;

/// Main application configuration
///
/// Every section falls back to its defaults, so a config file only needs the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where charts go and how failures are handled
    pub output: OutputSettings,

    /// Figure sizes, fonts and colours
    pub charts: ChartStyle,

    /// Trend fitting and extrapolation
    pub trend: TrendSettings,

    /// Progressive frame sequences
    pub frames: FrameSettings,

    pub logging: LogConfig,
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config
            .charts
            .validate()
            .with_context(|| format!("Invalid chart settings in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// `~/.repchart/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".repchart")
            .join("config.toml")
    }

    /// Load the default config file, or defaults when it is absent or broken
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            match Self::load_from_file(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(
                        path = %config_path.display(),
                        error = %e,
                        "Failed to load config, using defaults"
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Load `path` when given, the default config file otherwise
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::load_or_default()),
        }
    }
}
