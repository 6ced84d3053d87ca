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
    /// Page cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Redis configuration (required when the cache backend is Redis).
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Uploaded media configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Admin configuration.
    #[serde(default)]
    pub admin: AdminConfig,
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
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Where rendered pages are cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process cache, local to one server process.
    #[default]
    Memory,
    /// Redis, shared between server processes.
    Redis,
}

/// Page cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache backend.
    #[serde(default)]
    pub backend: CacheBackend,
    /// How long the rendered main page stays cached, in seconds.
    #[serde(default = "default_index_ttl_secs")]
    pub index_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            index_ttl_secs: default_index_ttl_secs(),
        }
    }
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

/// Uploaded media configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    /// URL prefix uploaded files are served under.
    #[serde(default = "default_media_url")]
    pub base_url: String,
    /// Maximum accepted request body size for uploads, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            base_url: default_media_url(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Admin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Usernames that are granted staff rights when they sign up.
    #[serde(default)]
    pub staff_usernames: Vec<String>,
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
    2
}

const fn default_index_ttl_secs() -> u64 {
    20
}

fn default_redis_prefix() -> String {
    "yatube".to_string()
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_media_url() -> String {
    "/media".to_string()
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, via `dotenvy`)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `YATUBE_ENV`)
    /// 4. Environment variables with `YATUBE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("YATUBE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("YATUBE")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("admin.staff_usernames"),
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

    /// Whether a username is granted staff rights.
    #[must_use]
    pub fn is_staff_username(&self, username: &str) -> bool {
        self.admin
            .staff_usernames
            .iter()
            .any(|name| name.eq_ignore_ascii_case(username))
    }
}
