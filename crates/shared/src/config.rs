//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    #[serde(default)]
    pub jwt: JwtConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Fiscal calendar configuration.
    #[serde(default)]
    pub fiscal: FiscalConfig,
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
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token lifetime in minutes.
    #[serde(default = "default_token_expiry_minutes")]
    pub token_expiry_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            token_expiry_minutes: default_token_expiry_minutes(),
        }
    }
}

fn default_token_expiry_minutes() -> i64 {
    60
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for attachment custody.
    #[serde(default = "default_storage_root")]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> String {
    "./uploads".to_string()
}

/// Fiscal calendar configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FiscalConfig {
    /// IANA timezone the organization keeps its books in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for FiscalConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "America/Toronto".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TRESORERIE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("TRESORERIE__DATABASE__URL", Some("postgres://localhost/t")),
                ("TRESORERIE__JWT__SECRET", Some("env-secret")),
            ],
            || {
                let config = AppConfig::load().expect("config should load from env");
                assert_eq!(config.database.url, "postgres://localhost/t");
                assert_eq!(config.jwt.secret, "env-secret");
                assert_eq!(config.jwt.token_expiry_minutes, 60);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.storage.root, "./uploads");
                assert_eq!(config.fiscal.timezone, "America/Toronto");
            },
        );
    }

    #[test]
    fn environment_overrides_nested_values() {
        temp_env::with_vars(
            [
                ("TRESORERIE__DATABASE__URL", Some("postgres://localhost/t")),
                ("TRESORERIE__JWT__SECRET", Some("s")),
                ("TRESORERIE__SERVER__PORT", Some("9999")),
                ("TRESORERIE__FISCAL__TIMEZONE", Some("America/Montreal")),
            ],
            || {
                let config = AppConfig::load().expect("config should load from env");
                assert_eq!(config.server.port, 9999);
                assert_eq!(config.fiscal.timezone, "America/Montreal");
            },
        );
    }
}
