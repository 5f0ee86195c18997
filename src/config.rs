use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::sync::MatchMode;

/// Which search index implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    Elasticsearch,
    Memory,
}

impl fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBackend::Elasticsearch => write!(f, "elasticsearch"),
            SearchBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for SearchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elasticsearch" => Ok(SearchBackend::Elasticsearch),
            "memory" => Ok(SearchBackend::Memory),
            _ => Err(format!(
                "Invalid search backend '{}'. Valid options: elasticsearch, memory",
                s
            )),
        }
    }
}

/// Search index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Mirror items into the search index
    pub enabled: bool,
    pub backend: SearchBackend,
    /// Elasticsearch base URL
    pub url: String,
    /// Elasticsearch index name
    pub index: String,
    /// How name and category filters combine when both are given
    pub match_mode: MatchMode,
    /// Per-request timeout for the search backend
    pub timeout_secs: u64,
    /// Maximum number of hits returned by a search, including an unfiltered
    /// one that lists the whole index
    pub max_results: usize,
    /// Rebuild the index from the database when the server starts
    pub reindex_on_startup: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: SearchBackend::default(),
            url: "http://localhost:9200".to_string(),
            index: "badges".to_string(),
            match_mode: MatchMode::default(),
            timeout_secs: 5,
            max_results: 1000,
            reindex_on_startup: false,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: PathBuf,
    /// Port the HTTP server listens on
    pub port: u16,
    pub search: SearchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("badgecat")
                .join("badgecat.db"),
            port: 8080,
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        config.apply_env()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(db_path) = std::env::var("BADGECAT_DATABASE_PATH") {
            self.database_path = PathBuf::from(db_path);
        }
        if let Some(port) = env_parse("BADGECAT_PORT")? {
            self.port = port;
        }
        if let Some(enabled) = env_parse("BADGECAT_SEARCH_ENABLED")? {
            self.search.enabled = enabled;
        }
        if let Some(backend) = env_parse("BADGECAT_SEARCH_BACKEND")? {
            self.search.backend = backend;
        }
        if let Ok(url) = std::env::var("BADGECAT_SEARCH_URL") {
            self.search.url = url;
        }
        if let Ok(index) = std::env::var("BADGECAT_SEARCH_INDEX") {
            self.search.index = index;
        }
        if let Some(match_mode) = env_parse("BADGECAT_SEARCH_MATCH_MODE")? {
            self.search.match_mode = match_mode;
        }
        Ok(())
    }

    /// Default config file path: ~/.config/badgecat/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("badgecat")
            .join("config.yaml")
    }
}

fn env_parse<T>(var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::EnvError(var.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    EnvError(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
            ConfigError::EnvError(var, e) => {
                write!(f, "Invalid value for {}: {}", var, e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
