// Application state module
// Explicit runtime context shared by every request handler

use hyper::body::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::types::Config;
use crate::error::Result;
use crate::logger;
use crate::routing::RouteTable;
use crate::storage::Database;

/// Application state
pub struct AppState {
    pub config: Config,
    pub routes: RouteTable,
    pub database: Database,
    /// Compressed resource bodies keyed by request URL
    pub resource_cache: RwLock<HashMap<String, Bytes>>,
}

impl AppState {
    /// Build the context; nothing is opened until `init` or first use
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            routes: RouteTable::new(&config.routes.file),
            database: Database::new(&config.database.url, config.database.max_connections),
            resource_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Build the context around an already constructed database
    pub fn with_database(config: &Config, database: Database) -> Self {
        Self {
            config: config.clone(),
            routes: RouteTable::new(&config.routes.file),
            database,
            resource_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load the route table and open the database pool
    pub async fn init(&self) -> Result<()> {
        self.routes.load().await?;
        self.database.pool().await?;
        Ok(())
    }

    /// Release the database pool and drop cached resources
    pub async fn shutdown(&self) {
        self.resource_cache.write().await.clear();
        self.database.close().await;
        logger::log_info("Application context shut down");
    }
}
