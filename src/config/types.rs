// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub resources: ResourcesConfig,
    pub routes: RoutesConfig,
    pub scrape: ScrapeConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Listen backlog passed to `listen(2)`
    pub backlog: i32,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Deployment environment
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Application-level settings
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub environment: Environment,
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite://ufo.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Static resource configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ResourcesConfig {
    /// Directory resource URLs are resolved against
    pub client_dir: String,
}

/// Route table configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// TOML file mapping controller names to controller keys
    pub file: String,
}

/// Scraper configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeConfig {
    /// Report index URL with `::year` and `::month` placeholders
    pub frequency_url: String,
    pub starting_year: i32,
    pub state_codes_url: String,
    /// Census API URL with `{{censusCode}}` and `{{apiKey}}` placeholders
    pub census_api_url: String,
    #[serde(default)]
    pub census_api_key: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}
