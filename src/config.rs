//! Configuration
//!
//! Provides configuration management with:
//! - Runtime defaults (including the default source catalog)
//! - Config file loading (optional)
//! - Environment variable overrides
//! - Validation

use crate::brand::SourceCatalog;
use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,

    /// Remote sources and the sheet-to-brand catalog
    pub sources: SourcesConfig,

    pub output: OutputConfig,

    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// `console`, `file` or `both`
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    pub name: String,
    pub brands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Published spreadsheet CSV export; each tab is requested with `sheet=<name>`
    pub sheet_base_url: Option<String>,
    /// Apps Script endpoint returning every tab as one JSON document
    pub script_url: Option<String>,
    pub revalidate_secs: u64,
    pub timeout_secs: u64,
    pub sheets: Vec<SheetConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let sheets = SourceCatalog::default()
            .entries()
            .iter()
            .map(|entry| SheetConfig {
                name: entry.name.clone(),
                brands: entry.brands.iter().map(|b| b.to_string()).collect(),
            })
            .collect();

        Self {
            sheet_base_url: None,
            script_url: None,
            revalidate_secs: 300,
            timeout_secs: 15,
            sheets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_pretty: bool,
    pub currency_symbol: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_pretty: true,
            currency_symbol: "R$".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the first config file found, and environment
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Like [`Config::load`], but an explicit file replaces the search path
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                info!(config_file = %path.display(), "Loading configuration from file");
                Self::load_from_file(path)?
            }
            None => {
                let config_paths = [
                    Some(PathBuf::from("ads-insights.toml")),
                    Some(PathBuf::from(".ads-insights.toml")),
                    dirs::config_dir().map(|d| d.join("ads-insights").join("config.toml")),
                ];

                let found = config_paths.iter().flatten().find(|path| path.exists());
                match found {
                    Some(path) => {
                        info!(config_file = %path.display(), "Loading configuration from file");
                        Self::load_from_file(path)?
                    }
                    None => Config::default(),
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("ADS_SHEET_BASE_URL") {
            self.sources.sheet_base_url = Some(val).filter(|v| !v.trim().is_empty());
        }
        if let Ok(val) = env::var("ADS_SCRIPT_URL") {
            self.sources.script_url = Some(val).filter(|v| !v.trim().is_empty());
        }
        if let Ok(val) = env::var("ADS_REVALIDATE_SECS") {
            self.sources.revalidate_secs = val.parse().context("Invalid ADS_REVALIDATE_SECS")?;
        }
        if let Ok(val) = env::var("ADS_FETCH_TIMEOUT_SECS") {
            self.sources.timeout_secs = val.parse().context("Invalid ADS_FETCH_TIMEOUT_SECS")?;
        }

        if let Ok(val) = env::var("ADS_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sources.timeout_secs == 0 {
            return Err(anyhow::anyhow!("Fetch timeout must be greater than 0"));
        }

        if self.sources.revalidate_secs == 0 {
            warn!("Revalidation window is 0; every read will hit the remote sources");
        }

        if let Some(sheet) = self.sources.sheets.iter().find(|s| s.name.trim().is_empty()) {
            return Err(anyhow::anyhow!(
                "Sheet names cannot be empty (brands: {:?})",
                sheet.brands
            ));
        }

        self.catalog()?;

        if let Some(url) = &self.sources.sheet_base_url {
            Url::parse(url).with_context(|| format!("Invalid sheet_base_url: {}", url))?;
        }
        if let Some(url) = &self.sources.script_url {
            Url::parse(url).with_context(|| format!("Invalid script_url: {}", url))?;
        }

        if !matches!(self.logging.output.as_str(), "console" | "file" | "both") {
            warn!(output = %self.logging.output, "Unknown log output, using console");
        }

        Ok(())
    }

    /// Sheet-to-brand catalog built from `[[sources.sheets]]`
    pub fn catalog(&self) -> Result<SourceCatalog> {
        SourceCatalog::from_names(
            self.sources
                .sheets
                .iter()
                .map(|sheet| (sheet.name.clone(), sheet.brands.clone())),
        )
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
