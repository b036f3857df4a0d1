//! Application configuration management.

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Prefix for environment variable overrides (`MADANI__SERVER__PORT=9000`).
const ENV_PREFIX: &str = "MADANI";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
///
/// Without a URL the server keeps posts and overflow documents in memory.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

/// Builds the layered configuration sources.
///
/// Later sources override earlier ones: `config/default`, `config/{RUN_MODE}`,
/// then `MADANI__*` environment variables.
fn sources() -> Result<config::Config, config::ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        sources()?.try_deserialize()
    }
}

/// Loads one named section of the layered configuration.
///
/// Crates that own their settings (storage limits, external providers) use this
/// instead of widening `AppConfig`. A missing section deserializes from an empty
/// table, so types with serde defaults load without any file present.
///
/// # Errors
///
/// Returns an error if the section exists but does not match `T`.
pub fn load_section<T: DeserializeOwned>(section: &str) -> Result<T, config::ConfigError> {
    let config = sources()?;
    match config.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => {
            T::deserialize(serde_json::Value::Object(serde_json::Map::new()))
                .map_err(|e| config::ConfigError::Message(e.to_string()))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Limits {
        #[serde(default = "default_limit")]
        limit: u64,
    }

    fn default_limit() -> u64 {
        42
    }

    #[test]
    fn test_server_config_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn test_missing_section_uses_serde_defaults() {
        let limits: Limits = temp_env::with_var_unset("MADANI__LIMITS__LIMIT", || {
            load_section("limits").expect("defaults should load")
        });
        assert_eq!(limits.limit, 42);
    }

    #[test]
    fn test_section_reads_environment_override() {
        let limits: Limits = temp_env::with_var("MADANI__LIMITS__LIMIT", Some("7"), || {
            load_section("limits").expect("override should load")
        });
        assert_eq!(limits.limit, 7);
    }

    #[test]
    fn test_app_config_without_database_url() {
        let config = temp_env::with_var_unset("MADANI__DATABASE__URL", || {
            AppConfig::load().expect("config should load")
        });
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 10);
    }
}
