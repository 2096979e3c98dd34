//! Request handler module
//!
//! Turns HTTP requests into controller invocations and controller output
//! into HTTP responses.

pub mod dispatcher;

// Re-export main entry point
pub use dispatcher::handle_request;
