//! Routing module
//!
//! Maps the first path segment of a request to a controller through a TOML
//! route file, and the second segment to an action name.
//! - Reserved names: `home`, `404`, `resources`
//! - Resource detection and Content-Type lookup live in `http::mime`

mod table;

pub use crate::http::mime::{content_type_for, is_static_resource};
pub use table::{resolve_action, RouteTable, Routes, DEFAULT_ACTION};
