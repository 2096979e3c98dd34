//! Controllers module
//!
//! Each controller is a set of named actions. The route table names
//! controllers by key, and the dispatcher invokes them through `Controller`.

pub mod geography;
pub mod not_found;
pub mod resources;

use hyper::body::Bytes;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::AppState;
use crate::error::{AppError, Result};
use crate::http::QueryParams;

/// Every controller a route file may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Geography,
    Resources,
    NotFound,
}

impl Controller {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Geography => "geography",
            Self::Resources => "resources",
            Self::NotFound => "not_found",
        }
    }

    /// Run `action` with `params`
    ///
    /// # Errors
    /// `AppError::UnknownAction` when the controller has no such action, or
    /// whatever the action itself fails with.
    pub async fn invoke(self, action: &str, params: Params, state: &AppState) -> Result<ActionOutput> {
        match self {
            Self::Geography => geography::invoke(action, &params, state).await,
            Self::Resources => resources::invoke(action, &params, state).await,
            Self::NotFound => Ok(not_found::invoke()),
        }
    }

    pub(crate) fn unknown_action(self, action: &str) -> AppError {
        AppError::UnknownAction {
            controller: self.name(),
            action: action.to_string(),
        }
    }
}

/// Arguments handed to an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    /// Parsed query string of a controller request
    Query(QueryParams),
    /// URL path of a static resource, leading slash removed
    Resource(String),
}

/// What an action produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    pub body: Bytes,
    /// Overrides the Content-Type derived from the URL
    pub content_type: Option<&'static str>,
    pub status: StatusCode,
    /// Body is gzip-compressed
    pub gzip: bool,
}

impl ActionOutput {
    pub fn html(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
            status: StatusCode::OK,
            gzip: false,
        }
    }

    pub fn json(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            content_type: Some("application/json"),
            status: StatusCode::OK,
            gzip: false,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_keys() {
        let parsed: std::collections::HashMap<String, Controller> =
            toml::from_str("a = \"geography\"\nb = \"not_found\"\nc = \"resources\"").unwrap();
        assert_eq!(parsed["a"], Controller::Geography);
        assert_eq!(parsed["b"], Controller::NotFound);
        assert_eq!(parsed["c"].name(), "resources");
    }

    #[test]
    fn test_output_builders() {
        let out = ActionOutput::json("{}");
        assert_eq!(out.content_type, Some("application/json"));
        let out = ActionOutput::html("<p></p>").with_status(StatusCode::NOT_FOUND);
        assert_eq!(out.status, StatusCode::NOT_FOUND);
        assert!(out.content_type.is_none());
    }
}
