//! Configuration loading and validation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::registry::RosterLayout;
use crate::sheet::{ColumnSpan, SheetLayout};

/// A1 cell or column reference, e.g. `A1`, `K2000`, `K`.
const A1_PATTERN: &str = r"^[A-Za-z]{1,3}[0-9]*$";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Spreadsheet connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Spreadsheet document id
    pub sheet_id: String,

    /// API key for the values endpoint; falls back to `HEARTS_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the Sheets API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// One named range to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeConfig {
    /// Logical name the pipeline refers to
    pub name: String,

    /// Sheet (tab) name
    pub page: String,

    pub start: String,
    pub end: String,
}

impl RangeConfig {
    /// `Page!A1:K2000`
    pub fn a1_notation(&self) -> String {
        format!("{}!{}:{}", self.page, self.start, self.end)
    }
}

/// Which named ranges hold the roster and the games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRoles {
    #[serde(default = "default_roster_range")]
    pub roster: String,

    #[serde(default = "default_games_ranges")]
    pub games: Vec<String>,
}

fn default_roster_range() -> String {
    "player_data".to_string()
}

fn default_games_ranges() -> Vec<String> {
    vec!["games".to_string()]
}

impl Default for RangeRoles {
    fn default() -> Self {
        Self {
            roster: default_roster_range(),
            games: default_games_ranges(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    pub sheet: SheetConfig,

    #[serde(rename = "range")]
    pub ranges: Vec<RangeConfig>,

    #[serde(default)]
    pub roles: RangeRoles,

    #[serde(default)]
    pub layout: SheetLayout,

    #[serde(default)]
    pub roster_layout: RosterLayout,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a configured range by name.
    pub fn range(&self, name: &str) -> Option<&RangeConfig> {
        self.ranges.iter().find(|r| r.name == name)
    }

    /// API key from the config, or from the environment.
    pub fn api_key(&self) -> Option<String> {
        self.sheet
            .api_key
            .clone()
            .or_else(|| std::env::var("HEARTS_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.sheet.sheet_id.trim().is_empty() {
            return invalid("sheet.sheet_id must not be empty".to_string());
        }

        if self.sheet.timeout_seconds == 0 {
            return invalid("sheet.timeout_seconds must be greater than 0".to_string());
        }

        if self.ranges.is_empty() {
            return invalid("at least one [[range]] is required".to_string());
        }

        let a1 = Regex::new(A1_PATTERN).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        for (i, range) in self.ranges.iter().enumerate() {
            if range.name.is_empty() || range.page.is_empty() {
                return invalid(format!("range #{} needs a name and a page", i + 1));
            }
            if self.ranges[..i].iter().any(|r| r.name == range.name) {
                return invalid(format!("range name '{}' is used twice", range.name));
            }
            for cell in [&range.start, &range.end] {
                if !a1.is_match(cell) {
                    return invalid(format!(
                        "range '{}': '{}' is not an A1 reference",
                        range.name, cell
                    ));
                }
            }
        }

        let role_names =
            std::iter::once(&self.roles.roster).chain(self.roles.games.iter());
        for name in role_names {
            if self.range(name).is_none() {
                return invalid(format!("roles refer to undeclared range '{}'", name));
            }
        }

        validate_span("layout.left", &self.layout.left)?;
        validate_span("layout.right", &self.layout.right)?;
        if self.layout.left.overlaps(&self.layout.right) {
            return invalid("layout.left and layout.right overlap".to_string());
        }

        Ok(())
    }
}

fn validate_span(name: &str, span: &ColumnSpan) -> Result<(), ConfigError> {
    // id/label column plus at least one player column
    if span.width() < 2 {
        return Err(ConfigError::ValidationError(format!(
            "{} must span at least 2 columns",
            name
        )));
    }
    Ok(())
}
