//! Server configuration

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Directory holding the four recommendation tables
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HTTP port for the dashboard API, health and metrics
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a loaded dataset is served before revalidation
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Instance name attached to structured log events
    #[serde(default = "default_instance")]
    pub instance: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("dashboard_data")
}

fn default_port() -> u16 {
    8080
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "costdash".to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            port: default_port(),
            cache_ttl_secs: default_cache_ttl(),
            instance: default_instance(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `DASHBOARD_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("DASHBOARD"))
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;

        match config.try_deserialize() {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!(error = %e, "Invalid configuration, falling back to defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
