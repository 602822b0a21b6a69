//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration. When absent, the page cache lives in process.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Feed configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Page cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Uploaded media configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Session and login configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this site.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://` or `sqlite:`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Feed configuration, shared by every paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Number of posts per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

/// Page cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// How long a rendered home feed page is served from cache.
    #[serde(default = "default_index_ttl_secs")]
    pub index_ttl_secs: u64,
}

/// Uploaded media configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded images are written to.
    #[serde(default = "default_media_path")]
    pub base_path: PathBuf,
    /// URL prefix uploaded images are served from.
    #[serde(default = "default_media_url")]
    pub base_url: String,
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Session and login configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Where anonymous visitors of protected pages are sent.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Whether the session cookie is marked `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            index_ttl_secs: default_index_ttl_secs(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_path: default_media_path(),
            base_url: default_media_url(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            cookie_name: default_cookie_name(),
            cookie_secure: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

fn default_redis_prefix() -> String {
    "yatube".to_string()
}

const fn default_page_size() -> u64 {
    10
}

const fn default_index_ttl_secs() -> u64 {
    20
}

fn default_media_path() -> PathBuf {
    PathBuf::from("./media")
}

fn default_media_url() -> String {
    "/media".to_string()
}

const fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_login_url() -> String {
    "/auth/login/".to_string()
}

fn default_cookie_name() -> String {
    "yatube_session".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `YATUBE_ENV`)
    /// 4. Environment variables with `YATUBE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env is the common case in production.
        let _ = dotenvy::dotenv();

        let env = std::env::var("YATUBE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("YATUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("YATUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Minimal configuration for tests and local tooling.
    #[must_use]
    pub fn for_database(url: &str) -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                url: "http://localhost:8000".to_string(),
            },
            database: DatabaseConfig {
                url: url.to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            redis: None,
            feed: FeedConfig::default(),
            cache: CacheConfig::default(),
            media: MediaConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let raw = r#"
            [server]
            url = "https://yatube.example"

            [database]
            url = "postgres://localhost/yatube"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.feed.page_size, 10);
        assert_eq!(config.cache.index_ttl_secs, 20);
        assert_eq!(config.auth.login_url, "/auth/login/");
        assert_eq!(config.media.base_url, "/media");
        assert!(config.redis.is_none());
    }

    #[test]
    fn test_overrides_from_toml() {
        let raw = r#"
            [server]
            url = "https://yatube.example"
            port = 9000

            [database]
            url = "postgres://localhost/yatube"

            [feed]
            page_size = 25

            [redis]
            url = "redis://localhost"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.feed.page_size, 25);
        assert_eq!(config.redis.unwrap().prefix, "yatube");
    }

    #[test]
    fn test_for_database() {
        let config = Config::for_database("sqlite::memory:");
        assert_eq!(config.database.max_connections, 1);
        assert_eq!(config.feed.page_size, 10);
    }
}
