//! Route table
//!
//! The route file is a flat TOML table of `name = "controller"` pairs:
//!
//! ```toml
//! home = "geography"
//! geography = "geography"
//! "404" = "not_found"
//! resources = "resources"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::OnceCell;

use crate::controllers::Controller;
use crate::error::{AppError, Result};
use crate::logger;

/// Action invoked when the URL names none
pub const DEFAULT_ACTION: &str = "init";

const HOME_ROUTE: &str = "home";
const NOT_FOUND_ROUTE: &str = "404";
const RESOURCES_ROUTE: &str = "resources";

/// Parsed route file with the reserved routes pulled out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    entries: HashMap<String, Controller>,
    home: Controller,
    not_found: Controller,
    resources: Controller,
}

impl Routes {
    /// Parse route file text; every reserved name must be present
    pub fn parse(text: &str) -> Result<Self> {
        let entries: HashMap<String, Controller> =
            toml::from_str(text).map_err(|e| AppError::RouteFile(e.to_string()))?;

        let reserved = |name: &str| {
            entries
                .get(name)
                .copied()
                .ok_or_else(|| AppError::RouteFile(format!("missing reserved route '{name}'")))
        };

        let home = reserved(HOME_ROUTE)?;
        let not_found = reserved(NOT_FOUND_ROUTE)?;
        let resources = reserved(RESOURCES_ROUTE)?;

        Ok(Self {
            entries,
            home,
            not_found,
            resources,
        })
    }

    pub fn controller(&self, name: Option<&str>) -> Controller {
        match name {
            None | Some("") => self.home,
            Some(name) => self.entries.get(name).copied().unwrap_or(self.not_found),
        }
    }

    pub const fn resources(&self) -> Controller {
        self.resources
    }

    pub fn route_count(&self) -> usize {
        self.entries.len()
    }
}

/// Route file bound to the application context, read on first use
pub struct RouteTable {
    path: PathBuf,
    routes: OnceCell<Routes>,
}

impl RouteTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            routes: OnceCell::new(),
        }
    }

    /// Table that is already loaded and never touches the filesystem
    pub fn preloaded(routes: Routes) -> Self {
        Self {
            path: PathBuf::new(),
            routes: OnceCell::new_with(Some(routes)),
        }
    }

    /// Read and validate the route file; later calls return the cached table
    pub async fn load(&self) -> Result<&Routes> {
        self.routes
            .get_or_try_init(|| async {
                let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                    AppError::RouteFile(format!("{}: {e}", self.path.display()))
                })?;
                let routes = Routes::parse(&text)?;
                logger::log_info(&format!(
                    "Loaded {} routes from {}",
                    routes.route_count(),
                    self.path.display()
                ));
                Ok(routes)
            })
            .await
    }

    /// Controller for the first path segment; unknown names go to the 404 route
    pub async fn resolve_controller(&self, name: Option<&str>) -> Result<Controller> {
        Ok(self.load().await?.controller(name))
    }

    pub async fn resolve_resource_controller(&self) -> Result<Controller> {
        Ok(self.load().await?.resources())
    }
}

/// Action for the second path segment, `init` when absent
pub fn resolve_action(name: Option<&str>) -> &str {
    match name {
        None | Some("") => DEFAULT_ACTION,
        Some(name) => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ROUTES: &str = r#"
home = "geography"
geography = "geography"
"404" = "not_found"
resources = "resources"
"#;

    #[test]
    fn test_resolve_controller() {
        let routes = Routes::parse(ROUTES).unwrap();
        assert_eq!(routes.controller(None), Controller::Geography);
        assert_eq!(routes.controller(Some("")), Controller::Geography);
        assert_eq!(routes.controller(Some("geography")), Controller::Geography);
        assert_eq!(routes.controller(Some("martians")), Controller::NotFound);
        assert_eq!(routes.resources(), Controller::Resources);
    }

    #[test]
    fn test_resolve_action() {
        assert_eq!(resolve_action(None), "init");
        assert_eq!(resolve_action(Some("")), "init");
        assert_eq!(resolve_action(Some("getFilteredMapData")), "getFilteredMapData");
    }

    #[test]
    fn test_missing_reserved_route() {
        let err = Routes::parse("home = \"geography\"\nresources = \"resources\"").unwrap_err();
        assert!(err.to_string().contains("'404'"));
    }

    #[test]
    fn test_unknown_controller_key() {
        let text = format!("{ROUTES}\nsaucers = \"saucer_controller\"");
        assert!(matches!(Routes::parse(&text), Err(AppError::RouteFile(_))));
    }

    #[tokio::test]
    async fn test_load_once() {
        let path = std::env::temp_dir().join(format!("ufo_atlas_routes_{}.toml", std::process::id()));
        std::fs::File::create(&path)
            .unwrap()
            .write_all(ROUTES.as_bytes())
            .unwrap();

        let table = RouteTable::new(&path);
        assert_eq!(table.load().await.unwrap().route_count(), 4);

        // Cached: removing the file does not matter any more
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            table.resolve_controller(Some("nope")).await.unwrap(),
            Controller::NotFound
        );
        assert_eq!(
            table.resolve_resource_controller().await.unwrap(),
            Controller::Resources
        );
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let table = RouteTable::new("/definitely/not/here/routes.toml");
        assert!(matches!(table.load().await, Err(AppError::RouteFile(_))));
    }
}
