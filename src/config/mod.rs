//! Configuration management
//!
//! YAML-based configuration with environment variable overrides, multiple
//! file locations and defaults for every setting. A config file that cannot
//! be read or parsed is logged and replaced by defaults so request handling
//! keeps working; an optional `warning` key is surfaced as an informational
//! field on every response envelope.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Operator notice surfaced on every response envelope
    #[serde(default)]
    pub warning: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_mongo_url")]
    pub url: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_alerts_collection")]
    pub alerts_collection: String,
    /// Management collection holding the per-operation usage records
    #[serde(default = "default_metrics_collection")]
    pub metrics_collection: String,
}

/// Message broker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
    /// Ordered `host:port` failover list
    #[serde(default = "default_broker_addresses")]
    pub addresses: Vec<String>,
    #[serde(default = "default_notify_topic")]
    pub topic: String,
    /// Message TTL fed into the `expires` header
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: u64,
}

/// API behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// When true, list aggregate counts cover the full filtered set instead
    /// of the limit-bounded page that is returned. The historical behavior
    /// (false) counts only the returned page.
    #[serde(default)]
    pub counts_over_full_set: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
    Pretty,
}

/// Where log output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Console,
    File,
    Both,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    #[serde(default)]
    pub daily_rotation: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_mongo_url() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "monitoring".to_string()
}

fn default_alerts_collection() -> String {
    "alerts".to_string()
}

fn default_metrics_collection() -> String {
    "status".to_string()
}

fn default_broker_addresses() -> Vec<String> {
    vec!["localhost:61613".to_string()]
}

fn default_notify_topic() -> String {
    "/topic/notify".to_string()
}

fn default_expiration_secs() -> u64 {
    600
}

fn default_base_path() -> String {
    "/alerta/api/v1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/alerta")
}

fn default_log_prefix() -> String {
    "alert-dbapi.log".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_mongo_url(),
            database: default_database(),
            alerts_collection: default_alerts_collection(),
            metrics_collection: default_metrics_collection(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            addresses: default_broker_addresses(),
            topic: default_notify_topic(),
            expiration_secs: default_expiration_secs(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            counts_over_full_set: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides
    /// earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables (prefixed with ALERTA_)
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        // Check for config path override from environment
        let config_path = std::env::var("ALERTA_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => match std::fs::read_to_string(path) {
                Ok(contents) => match serde_norway::from_str::<AppConfig>(&contents) {
                    Ok(parsed) => {
                        eprintln!("[CONFIG] Loaded configuration from: {:?}", path);
                        parsed
                    }
                    Err(err) => {
                        eprintln!(
                            "[CONFIG] Failed to parse config file {:?}: {}, using defaults",
                            path, err
                        );
                        AppConfig::default()
                    }
                },
                Err(err) => {
                    eprintln!(
                        "[CONFIG] Failed to read config file {:?}: {}, using defaults",
                        path, err
                    );
                    AppConfig::default()
                }
            },
            Some(path) => {
                eprintln!("[CONFIG] Config file not found: {:?}, using defaults", path);
                AppConfig::default()
            }
            None => {
                eprintln!("[CONFIG] No config file found, using defaults");
                AppConfig::default()
            }
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Current directory
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            // System config directory
            PathBuf::from("/etc/alerta/alert-dbapi.yaml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("alerta/alert-dbapi.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(host) = std::env::var("ALERTA_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ALERTA_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Document store overrides
        if let Ok(url) = std::env::var("MONGODB_URL") {
            self.database.url = url;
        }
        if let Ok(name) = std::env::var("ALERTA_DATABASE") {
            self.database.database = name;
        }

        // Broker overrides
        if let Ok(urls) = std::env::var("BROKER_URLS") {
            let addresses: Vec<String> = urls
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !addresses.is_empty() {
                self.broker.addresses = addresses;
            }
        }
        if let Ok(topic) = std::env::var("ALERTA_NOTIFY_TOPIC") {
            self.broker.topic = topic;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ALERTA_LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Compact,
            };
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.broker.addresses.is_empty() {
            anyhow::bail!("broker.addresses must list at least one host:port");
        }
        if self.broker.expiration_secs == 0 {
            anyhow::bail!("broker.expiration_secs must be greater than zero");
        }
        if !self.api.base_path.starts_with('/') {
            anyhow::bail!("api.base_path must start with '/'");
        }
        Ok(())
    }
}
