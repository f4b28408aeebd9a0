//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP endpoint listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Credential callers must send in `x-api-key`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// SerpAPI credential; shopping search is disabled without it
    #[serde(default, skip_serializing)]
    pub serpapi_key: Option<String>,

    /// Upper bound for each outbound call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Results kept from each marketplace call
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Exchange-rate service base URL
    #[serde(default = "default_fx_url")]
    pub fx_url: String,

    /// Mercado Libre API base URL
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// SerpAPI base URL
    #[serde(default = "default_shopping_url")]
    pub shopping_url: String,

    /// Output format for the `compare` command
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_results() -> usize {
    8
}

fn default_fx_url() -> String {
    "https://api.exchangerate.host".to_string()
}

fn default_catalog_url() -> String {
    "https://api.mercadolibre.com".to_string()
}

fn default_shopping_url() -> String {
    "https://serpapi.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            api_key: None,
            serpapi_key: None,
            timeout_secs: default_timeout_secs(),
            max_results: default_max_results(),
            fx_url: default_fx_url(),
            catalog_url: default_catalog_url(),
            shopping_url: default_shopping_url(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("price-compare").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Some(key) = non_empty_env("API_KEY") {
            self.api_key = Some(key);
        }

        if let Some(key) = non_empty_env("SERPAPI_KEY") {
            self.serpapi_key = Some(key);
        }

        if let Some(bind) = non_empty_env("PRICE_COMPARE_BIND") {
            self.bind = bind;
        }

        if let Some(timeout) = non_empty_env("PRICE_COMPARE_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }

        self
    }

    /// Per-call timeout for outbound requests.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Whether the optional shopping-search source is enabled.
    pub fn shopping_enabled(&self) -> bool {
        self.serpapi_key.is_some()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
