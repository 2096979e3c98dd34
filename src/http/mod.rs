//! HTTP protocol layer module
//!
//! URL parsing, resource/MIME detection and response builders, decoupled from
//! the controllers that produce response bodies.

pub mod mime;
pub mod query;
pub mod response;

pub use mime::{content_type_for, is_static_resource};
pub use query::{parse_query, QueryParams};
pub use response::{
    build_413_response, build_empty_response, build_internal_error_response,
    build_success_response, SuccessHeaders,
};
