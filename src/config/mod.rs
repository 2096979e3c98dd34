// Configuration module entry point
// Loads application configuration and owns the runtime context

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    AppConfig, Config, DatabaseConfig, Environment, HttpConfig, LoggingConfig, PerformanceConfig,
    ResourcesConfig, RoutesConfig, ScrapeConfig, ServerConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("ATLAS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.backlog", 128)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "ufo-atlas/0.1")?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("app.base_url", "http://localhost:3000/")?
            .set_default("app.environment", "prod")?
            .set_default("database.url", "sqlite://ufo.db")?
            .set_default("database.max_connections", 1)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("resources.client_dir", "client")?
            .set_default("routes.file", "config/routes.toml")?
            .set_default(
                "scrape.frequency_url",
                "http://www.nuforc.org/webreports/ndxe::year::month.html",
            )?
            .set_default("scrape.starting_year", 2005)?
            .set_default(
                "scrape.state_codes_url",
                "http://www2.census.gov/geo/docs/reference/state.txt",
            )?
            .set_default(
                "scrape.census_api_url",
                "http://api.census.gov/data/2010/sf1?get=P0010001&for=state:{{censusCode}}&key={{apiKey}}",
            )?
            .set_default(
                "scrape.user_agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.9; rv:39.0) Gecko/20100101 Firefox/39.0",
            )?
            .set_default("scrape.timeout_secs", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
