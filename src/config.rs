//! Configuration management for shelfmark

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ShelfmarkError};

/// Environment variable holding the library information API key
pub const NARU_API_KEY_ENV: &str = "NAROU_API_KEY";

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Library information API settings
    #[serde(default)]
    pub library: LibraryConfig,

    /// Query analysis settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Network settings
    #[serde(default)]
    pub network: NetworkConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Library information API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// API base URL
    pub base_url: String,
    /// Region codes searched when locating a book, in order
    pub regions: Vec<String>,
    /// Results per page for book searches
    pub search_page_size: u32,
    /// Results per page for library lookups
    pub library_page_size: u32,
}

/// Query analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL
    pub base_url: String,
    /// Chat model
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Book search timeout in seconds
    pub search_timeout: u64,
    /// Library lookup timeout in seconds
    pub library_timeout: u64,
    /// Query analysis timeout in seconds
    pub openai_timeout: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable colored output
    pub color: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://data4library.kr/api".to_string(),
            // Seoul, then Gyeonggi
            regions: vec!["11".to_string(), "31".to_string()],
            search_page_size: 20,
            library_page_size: 50,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.5,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            search_timeout: 15,
            library_timeout: 20,
            openai_timeout: 60,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            color: true,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ShelfmarkError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("shelfmark").join("config.toml"))
    }

    /// Resolve an explicit path or fall back to the default location
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::config_path(),
        }
    }

    /// Load configuration from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ShelfmarkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "library.base_url" => Some(self.library.base_url.clone()),
            "library.regions" => Some(self.library.regions.join(",")),
            "library.search_page_size" => Some(self.library.search_page_size.to_string()),
            "library.library_page_size" => Some(self.library.library_page_size.to_string()),

            "openai.base_url" => Some(self.openai.base_url.clone()),
            "openai.model" => Some(self.openai.model.clone()),
            "openai.temperature" => Some(self.openai.temperature.to_string()),

            "network.search_timeout" => Some(self.network.search_timeout.to_string()),
            "network.library_timeout" => Some(self.network.library_timeout.to_string()),
            "network.openai_timeout" => Some(self.network.openai_timeout.to_string()),
            "network.user_agent" => Some(self.network.user_agent.clone()),

            "logging.level" => Some(self.logging.level.clone()),
            "logging.color" => Some(self.logging.color.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "library.base_url" => {
                self.library.base_url = value.trim_end_matches('/').to_string();
            }
            "library.regions" => {
                let regions: Vec<String> = value
                    .split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect();
                if regions.is_empty() {
                    return Err(ShelfmarkError::Config("At least one region is required".into()));
                }
                self.library.regions = regions;
            }
            "library.search_page_size" => {
                self.library.search_page_size = parse_page_size(value)?;
            }
            "library.library_page_size" => {
                self.library.library_page_size = parse_page_size(value)?;
            }

            "openai.base_url" => {
                self.openai.base_url = value.trim_end_matches('/').to_string();
            }
            "openai.model" => {
                self.openai.model = value.to_string();
            }
            "openai.temperature" => {
                let temperature: f32 = value.parse().map_err(|_| {
                    ShelfmarkError::Config("Invalid number for temperature".into())
                })?;
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(ShelfmarkError::Config(
                        "Temperature must be between 0 and 2".into(),
                    ));
                }
                self.openai.temperature = temperature;
            }

            "network.search_timeout" => {
                self.network.search_timeout = parse_timeout(value)?;
            }
            "network.library_timeout" => {
                self.network.library_timeout = parse_timeout(value)?;
            }
            "network.openai_timeout" => {
                self.network.openai_timeout = parse_timeout(value)?;
            }
            "network.user_agent" => {
                let agent = value.trim();
                if agent.is_empty() {
                    return Err(ShelfmarkError::Config("User agent cannot be empty".into()));
                }
                self.network.user_agent = agent.to_string();
            }

            "logging.level" => {
                self.logging.level = value.to_string();
            }
            "logging.color" => {
                self.logging.color = value.parse().map_err(|_| {
                    ShelfmarkError::Config("Invalid boolean for color".into())
                })?;
            }

            _ => {
                return Err(ShelfmarkError::Config(format!("Unknown configuration key: {}", key)));
            }
        }

        Ok(())
    }
}

fn parse_page_size(value: &str) -> Result<u32> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ShelfmarkError::Config("Invalid page size".into())),
    }
}

fn parse_timeout(value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ShelfmarkError::Config("Invalid number for timeout".into())),
    }
}

/// Read an API key from the environment, treating blank values as unset
pub fn api_key(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
