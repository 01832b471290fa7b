use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding document snapshots and the local registry
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Origin and path that shared links point at
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// How long to wait for a document to be found before giving up
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Maximum number of document handles kept in memory
    #[serde(default = "default_doc_cache_capacity")]
    pub doc_cache_capacity: u64,

    /// Buffered messages on the peer broadcast bus
    #[serde(default = "default_network_capacity")]
    pub network_capacity: usize,
}

impl Config {
    /// Load configuration from `app.env` (or `.env`) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = if Path::new("app.env").exists() {
            dotenvy::from_filename("app.env")
        } else {
            dotenvy::dotenv()
        };
        if let Ok(path) = env_file {
            debug!("Read environment file {}", path.display());
        }

        let config = envy::from_env::<Config>().inspect_err(|e| {
            error!("Failed to load configuration: {}", e);
        })?;
        info!(
            "Configuration loaded ({} environment, data in {})",
            config.environment,
            config.data_dir.display()
        );
        Ok(config)
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    /// Allowed CORS origins; empty means any origin.
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            data_dir: default_data_dir(),
            public_url: default_public_url(),
            load_timeout_ms: default_load_timeout_ms(),
            doc_cache_capacity: default_doc_cache_capacity(),
            network_capacity: default_network_capacity(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_public_url() -> String {
    "http://localhost:3000/".to_string()
}

fn default_load_timeout_ms() -> u64 {
    10_000
}

fn default_doc_cache_capacity() -> u64 {
    1_000
}

fn default_network_capacity() -> usize {
    256
}
