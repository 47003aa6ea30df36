//! Configuration module for Folio.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::{FolioError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Content storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Root directory holding `collections/<name>/files/*.md`.
    #[serde(default = "default_content_root")]
    pub root: String,
    /// Maximum size of a single markdown document in bytes.
    #[serde(default = "default_max_content_bytes")]
    pub max_content_bytes: u64,
    /// Front-matter field types, field name to type name
    /// (`text`, `select`, `date`, `number`, `checkbox`, `gallery`).
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

fn default_content_root() -> String {
    "data/content".to_string()
}

fn default_max_content_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_content_root(),
            max_content_bytes: default_max_content_bytes(),
            fields: HashMap::new(),
        }
    }
}

/// Media storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Root directory for uploaded images.
    #[serde(default = "default_media_root")]
    pub root: String,
    /// Public URL prefix under which the media root is served.
    #[serde(default = "default_media_url")]
    pub public_url: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Allowed image extensions (lower-case, no dot).
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_media_root() -> String {
    "data/public/img".to_string()
}

fn default_media_url() -> String {
    "/img".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "svg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            public_url: default_media_url(),
            max_upload_size_mb: default_max_upload_size(),
            image_extensions: default_image_extensions(),
        }
    }
}

/// File cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one `.cache` file per key.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    /// Whether caching is enabled at all.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// TTL for media directory listings in seconds.
    #[serde(default = "default_media_ttl")]
    pub media_ttl_secs: u64,
}

fn default_cache_dir() -> String {
    "data/cache".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_media_ttl() -> u64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            enabled: default_cache_enabled(),
            media_ttl_secs: default_media_ttl(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Whether log output is enabled.
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path. Empty string disables file logging.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    String::new()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Allowed CORS origins. Empty means permissive (development mode).
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Bearer token required for mutating actions. `None` leaves the
    /// endpoint open, for local single-admin use behind an external gate.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            auth_token: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Content storage settings.
    #[serde(default)]
    pub content: ContentConfig,
    /// Media storage settings.
    #[serde(default)]
    pub media: MediaConfig,
    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web endpoint settings.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| FolioError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }
}
