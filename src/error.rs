//! Application error type
//!
//! Connectivity failures (database, remote fetch) and handler errors all end up
//! here. Missing data (no population, empty scrape page) is never an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Fetch error for '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Route file error: {0}")]
    RouteFile(String),

    #[error("Controller '{controller}' has no action '{action}'")]
    UnknownAction { controller: &'static str, action: String },

    #[error("Invalid parameter '{name}': {reason}")]
    BadParameter { name: String, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn bad_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::BadParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
