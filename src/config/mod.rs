//! Configuration management
//!
//! Configuration is loaded from a `config.yml` file and may be overridden by
//! `BLOG_*` environment variables. Missing optional values are filled with
//! sensible defaults.

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
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Media (post image) configuration
    #[serde(default)]
    pub media: MediaConfig,
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
    8000
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
    "data/blog.db".to_string()
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

/// In-process cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Login session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Days before a session token expires
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_days: default_expiration_days(),
        }
    }
}

fn default_expiration_days() -> i64 {
    14
}

/// Media configuration for uploaded post images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory where uploaded images are stored
    #[serde(default = "default_media_path")]
    pub path: PathBuf,
    /// URL prefix the media directory is served under
    #[serde(default = "default_media_url_prefix")]
    pub url_prefix: String,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            path: default_media_path(),
            url_prefix: default_media_url_prefix(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_media_path() -> PathBuf {
    PathBuf::from("media")
}

fn default_media_url_prefix() -> String {
    "/media".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

impl MediaConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }

    /// Public URL of a stored media file
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), filename)
    }
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
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration.
    /// Invalid YAML is reported with its location.
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

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognized variables:
    /// - BLOG_SERVER_HOST, BLOG_SERVER_PORT, BLOG_SERVER_CORS_ORIGIN
    /// - BLOG_DATABASE_DRIVER, BLOG_DATABASE_URL
    /// - BLOG_CACHE_TTL_SECONDS
    /// - BLOG_SESSION_EXPIRATION_DAYS
    /// - BLOG_MEDIA_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("BLOG_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BLOG_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("BLOG_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("BLOG_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("BLOG_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(ttl) = std::env::var("BLOG_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(days) = std::env::var("BLOG_SESSION_EXPIRATION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                if days > 0 {
                    self.session.expiration_days = days;
                }
            }
        }

        if let Ok(path) = std::env::var("BLOG_MEDIA_PATH") {
            self.media.path = PathBuf::from(path);
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

// Tests touching process environment variables share this lock.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn config_yaml_roundtrip(port in 1u16..=65535, ttl in 1u64..=86400, days in 1i64..=365) {
            let mut config = Config::default();
            config.server.port = port;
            config.cache.ttl_seconds = ttl;
            config.session.expiration_days = days;

            let yaml = serde_yaml::to_string(&config).unwrap();
            let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

            prop_assert_eq!(parsed.server.port, port);
            prop_assert_eq!(parsed.cache.ttl_seconds, ttl);
            prop_assert_eq!(parsed.session.expiration_days, days);
        }

        #[test]
        fn env_port_takes_precedence_over_file(file_port in 1u16..=65535, env_port in 1u16..=65535) {
            let _guard = lock_env();
            let mut file = tempfile::NamedTempFile::new().unwrap();
            std::io::Write::write_all(&mut file, format!("server:\n  port: {}\n", file_port).as_bytes()).unwrap();

            std::env::set_var("BLOG_SERVER_PORT", env_port.to_string());
            let config = Config::load_with_env(file.path()).unwrap();
            std::env::remove_var("BLOG_SERVER_PORT");

            prop_assert_eq!(config.server.port, env_port);
        }
    }
}
