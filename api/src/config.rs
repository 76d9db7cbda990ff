//! Configuration loading: TOML file first, then `APIHUB_*` environment overrides.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    domain::request::{DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS},
    error::{ApiHubError, Result},
};

pub const ENV_DATABASE_URL: &str = "APIHUB_DATABASE_URL";
pub const ENV_LISTEN: &str = "APIHUB_LISTEN";
pub const ENV_LOG: &str = "APIHUB_LOG";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tester: TesterConfig,
    /// tracing `EnvFilter` directive, e.g. `info,apihub=debug`
    pub log: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Listen address, e.g. 127.0.0.1:3000
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TesterConfig {
    /// Used when a test request doesn't carry its own timeout.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_database_url() -> String {
    "sqlite:apihub.sqlite".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_user_agent() -> String {
    format!("apihub/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).map_err(|e| ApiHubError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` if given (a missing path is an error), falls back to
    /// defaults otherwise, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = fs::read_to_string(p)
                    .map_err(|e| ApiHubError::Config(format!("reading {}: {}", p.display(), e)))?;
                Self::from_toml_str(&raw)?
            }
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database.url = url;
        }
        if let Some(listen) = lookup(ENV_LISTEN) {
            self.server.listen = listen;
        }
        if let Some(log) = lookup(ENV_LOG) {
            self.log = Some(log);
        }
    }

    fn validate(&self) -> Result<()> {
        let timeout = self.tester.default_timeout_ms;
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout) {
            return Err(ApiHubError::Config(format!(
                "tester.default_timeout_ms must be within {}..={}, got {}",
                MIN_TIMEOUT_MS, MAX_TIMEOUT_MS, timeout
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ApiHubError::Config(
                "database.max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
