//! Static resource controller
//!
//! Reads stylesheets, images and scripts from the client directory and
//! answers them gzip-compressed. Compressed bodies are cached per URL except
//! in the `dev` environment, where edits must show up on reload.

use flate2::write::GzEncoder;
use flate2::Compression;
use hyper::body::Bytes;
use hyper::StatusCode;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use super::{ActionOutput, Controller, Params};
use crate::config::AppState;
use crate::error::{AppError, Result};
use crate::http::mime;
use crate::logger;
use crate::routing::DEFAULT_ACTION;

pub async fn invoke(action: &str, params: &Params, state: &AppState) -> Result<ActionOutput> {
    match (action, params) {
        (DEFAULT_ACTION, Params::Resource(url)) => init(url, state).await,
        (DEFAULT_ACTION, Params::Query(_)) => Err(AppError::bad_parameter("url", "resource path expected")),
        _ => Err(Controller::Resources.unknown_action(action)),
    }
}

/// Compressed contents of the resource at `url`
pub async fn init(url: &str, state: &AppState) -> Result<ActionOutput> {
    let key = mime::url_path(url).trim_start_matches('/');
    let use_cache = !state.config.app.environment.is_dev();

    if use_cache {
        if let Some(body) = state.resource_cache.read().await.get(key) {
            logger::log_debug(&format!("Serving {key} from the resource cache"));
            return Ok(gzip_output(body.clone()));
        }
    }

    let path = resolve_path(&state.config.resources.client_dir, key)?;
    let contents = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::ResourceNotFound(key.to_string()),
        _ => AppError::Io(e),
    })?;
    let body = Bytes::from(gzip(&contents)?);

    if use_cache {
        state
            .resource_cache
            .write()
            .await
            .insert(key.to_string(), body.clone());
    }

    Ok(gzip_output(body))
}

/// Join `relative` onto the client directory; only plain path components are allowed
fn resolve_path(client_dir: &str, relative: &str) -> Result<PathBuf> {
    let relative_path = Path::new(relative);
    let is_plain = relative_path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    if relative.is_empty() || !is_plain {
        logger::log_warning(&format!("Rejected resource path: {relative}"));
        return Err(AppError::ResourceNotFound(relative.to_string()));
    }

    Ok(Path::new(client_dir).join(relative_path))
}

fn gzip(contents: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(contents)?;
    Ok(encoder.finish()?)
}

fn gzip_output(body: Bytes) -> ActionOutput {
    ActionOutput {
        body,
        content_type: None,
        status: StatusCode::OK,
        gzip: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use crate::storage::Database;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn client_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ufo_atlas_{name}_{}", std::process::id()));
        std::fs::create_dir_all(dir.join("scripts")).unwrap();
        std::fs::write(dir.join("scripts/main.js"), "console.log('hi');").unwrap();
        dir
    }

    fn state(dir: &Path, environment: Environment) -> AppState {
        let mut config = Config::load_from("does-not-exist").unwrap();
        config.resources.client_dir = dir.to_string_lossy().into_owned();
        config.app.environment = environment;
        AppState::with_database(&config, Database::in_memory())
    }

    fn gunzip(body: &[u8]) -> String {
        let mut out = String::new();
        GzDecoder::new(body).read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_resolve_path_blocks_traversal() {
        assert!(resolve_path("client", "scripts/main.js").is_ok());
        assert!(resolve_path("client", "../Cargo.toml").is_err());
        assert!(resolve_path("client", "scripts/../../secret.js").is_err());
        assert!(resolve_path("client", "/etc/passwd").is_err());
        assert!(resolve_path("client", "").is_err());
    }

    #[tokio::test]
    async fn test_serves_gzipped_and_caches() {
        let dir = client_dir("cache");
        let state = state(&dir, Environment::Prod);

        let out = init("/scripts/main.js?v=3", &state).await.unwrap();
        assert!(out.gzip);
        assert_eq!(gunzip(&out.body), "console.log('hi');");

        // Cached copy survives the file changing
        std::fs::write(dir.join("scripts/main.js"), "changed").unwrap();
        let out = init("scripts/main.js", &state).await.unwrap();
        assert_eq!(gunzip(&out.body), "console.log('hi');");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_dev_bypasses_cache() {
        let dir = client_dir("dev");
        let state = state(&dir, Environment::Dev);

        init("scripts/main.js", &state).await.unwrap();
        std::fs::write(dir.join("scripts/main.js"), "changed").unwrap();
        let out = init("scripts/main.js", &state).await.unwrap();
        assert_eq!(gunzip(&out.body), "changed");
        assert!(state.resource_cache.read().await.is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let dir = client_dir("missing");
        let state = state(&dir, Environment::Prod);
        let err = init("images/nope.png", &state).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
