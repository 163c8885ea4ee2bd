//! Configuration management
//!
//! Configuration is loaded from:
//! - config.yml file
//! - Environment variables prefixed with `VITRINE_` (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upload (static media) configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Admin authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Rate limit configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/vitrine.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory that backs `/uploads/*`
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

/// Admin authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Mark the session cookie `Secure` (enable behind HTTPS)
    #[serde(default)]
    pub cookie_secure: bool,
    /// Email of the admin created on first start when no admin exists
    #[serde(default)]
    pub bootstrap_email: Option<String>,
    /// Password of the bootstrap admin
    #[serde(default)]
    pub bootstrap_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_days: default_session_days(),
            cookie_secure: false,
            bootstrap_email: None,
            bootstrap_password: None,
        }
    }
}

fn default_session_days() -> i64 {
    7
}

/// Rate limit configuration (fixed window counters)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in minutes
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
    /// Contact form submissions allowed per window and IP
    #[serde(default = "default_contact_max")]
    pub contact_max: i64,
    /// Login attempts allowed per window and IP
    #[serde(default = "default_login_max")]
    pub login_max: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            contact_max: default_contact_max(),
            login_max: default_login_max(),
        }
    }
}

fn default_window_minutes() -> i64 {
    15
}

fn default_contact_max() -> i64 {
    5
}

fn default_login_max() -> i64 {
    5
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - VITRINE_SERVER_HOST / VITRINE_SERVER_PORT / VITRINE_SERVER_CORS_ORIGIN
    /// - VITRINE_DATABASE_DRIVER / VITRINE_DATABASE_URL
    /// - VITRINE_CACHE_TTL_SECONDS
    /// - VITRINE_UPLOAD_PATH
    /// - VITRINE_AUTH_SESSION_DAYS / VITRINE_AUTH_COOKIE_SECURE
    /// - VITRINE_AUTH_BOOTSTRAP_EMAIL / VITRINE_AUTH_BOOTSTRAP_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the server misbehave at runtime
    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_days <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_days must be positive".to_string(),
            ));
        }
        if self.rate_limit.window_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.window_minutes must be positive".to_string(),
            ));
        }
        if self.rate_limit.contact_max <= 0 || self.rate_limit.login_max <= 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit maximums must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("VITRINE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("VITRINE_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("VITRINE_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("VITRINE_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("VITRINE_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(ttl) = std::env::var("VITRINE_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(path) = std::env::var("VITRINE_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }

        if let Ok(days) = std::env::var("VITRINE_AUTH_SESSION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.auth.session_days = days;
            }
        }
        if let Ok(secure) = std::env::var("VITRINE_AUTH_COOKIE_SECURE") {
            self.auth.cookie_secure = matches!(secure.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(email) = std::env::var("VITRINE_AUTH_BOOTSTRAP_EMAIL") {
            self.auth.bootstrap_email = Some(email);
        }
        if let Ok(password) = std::env::var("VITRINE_AUTH_BOOTSTRAP_PASSWORD") {
            self.auth.bootstrap_password = Some(password);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test module that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "VITRINE_SERVER_HOST",
    "VITRINE_SERVER_PORT",
    "VITRINE_SERVER_CORS_ORIGIN",
    "VITRINE_DATABASE_DRIVER",
    "VITRINE_DATABASE_URL",
    "VITRINE_CACHE_TTL_SECONDS",
    "VITRINE_UPLOAD_PATH",
    "VITRINE_AUTH_SESSION_DAYS",
    "VITRINE_AUTH_COOKIE_SECURE",
    "VITRINE_AUTH_BOOTSTRAP_EMAIL",
    "VITRINE_AUTH_BOOTSTRAP_PASSWORD",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_host_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255)
                .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d)),
            Just("localhost".to_string()),
            "[a-z][a-z0-9]{0,10}".prop_map(|s| s),
        ]
    }

    fn valid_config_strategy() -> impl Strategy<Value = Config> {
        (
            valid_host_strategy(),
            1u16..=65535,
            prop_oneof![Just(DatabaseDriver::Sqlite), Just(DatabaseDriver::Mysql)],
            1u64..=86400,
            1i64..=365,
            1i64..=120,
            1i64..=50,
        )
            .prop_map(|(host, port, driver, ttl_seconds, session_days, window_minutes, contact_max)| {
                Config {
                    server: ServerConfig {
                        host,
                        port,
                        cors_origin: default_cors_origin(),
                    },
                    database: DatabaseConfig {
                        driver,
                        url: default_database_url(),
                    },
                    cache: CacheConfig { ttl_seconds },
                    upload: UploadConfig::default(),
                    auth: AuthConfig {
                        session_days,
                        ..AuthConfig::default()
                    },
                    rate_limit: RateLimitConfig {
                        window_minutes,
                        contact_max,
                        login_max: default_login_max(),
                    },
                }
            })
    }

    fn malformed_yaml_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("server:\n  port: not_a_number".to_string()),
            Just("server:\n  port: [1, 2, 3]".to_string()),
            Just("server:\n  port: 99999999999999999999".to_string()),
            Just("cache:\n  ttl_seconds: -100".to_string()),
            Just("database:\n  driver: postgres".to_string()),
            Just("server: [invalid, list]".to_string()),
            Just("auth:\n  session_days: soon".to_string()),
            Just("rate_limit: true".to_string()),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn config_roundtrips_through_yaml(config in valid_config_strategy()) {
            let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let parsed = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(config.server.host, parsed.server.host);
            prop_assert_eq!(config.server.port, parsed.server.port);
            prop_assert_eq!(config.database.driver, parsed.database.driver);
            prop_assert_eq!(config.cache.ttl_seconds, parsed.cache.ttl_seconds);
            prop_assert_eq!(config.auth.session_days, parsed.auth.session_days);
            prop_assert_eq!(config.rate_limit.window_minutes, parsed.rate_limit.window_minutes);
            prop_assert_eq!(config.rate_limit.contact_max, parsed.rate_limit.contact_max);
        }

        #[test]
        fn malformed_config_is_an_error(yaml in malformed_yaml_strategy()) {
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            prop_assert!(Config::load(file.path()).is_err());
        }
    }
}
