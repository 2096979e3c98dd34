//! Resource detection and MIME type module
//!
//! Decides whether a URL names a static resource and which Content-Type to
//! answer it with.

/// Extensions served by the resources controller
pub const RESOURCE_EXTENSIONS: &[&str] = &["scss", "png", "svg", "js", "ico", "map"];

/// Content-Type for anything that is not a recognized resource
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Strip query string and fragment from a request URL
pub fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Extension of the last path segment, without the dot
///
/// # Examples
/// ```
/// use ufo_atlas::http::mime::extension;
/// assert_eq!(extension("/styles/main.scss?v=2"), Some("scss"));
/// assert_eq!(extension("/geography/init"), None);
/// ```
pub fn extension(url: &str) -> Option<&str> {
    let path = url_path(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    last_segment
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Whether the URL asks for a stylesheet, image, script, icon or source map
pub fn is_static_resource(url: &str) -> bool {
    extension(url).is_some_and(|ext| RESOURCE_EXTENSIONS.contains(&ext))
}

/// Content-Type for a request URL, `text/html` when no extension matches
pub fn content_type_for(url: &str) -> &'static str {
    match extension(url) {
        Some("ico") => "image/vnd.microsoft.icon",
        Some("scss") => "text/css",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("js" | "map") => "application/javascript",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
