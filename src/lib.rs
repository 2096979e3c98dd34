//! UFO sighting atlas
//!
//! Scrapes monthly sighting reports, stores per-region counts in SQLite and
//! serves raw and per-capita rankings over HTTP.

pub mod analysis;
pub mod config;
pub mod controllers;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod scrape;
pub mod server;
pub mod storage;

pub use error::{AppError, Result};
