// Server module entry point
// Binds the listener and runs the accept loop on the current thread's LocalSet

pub mod connection;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name (keyword), so use server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::AppState;
use crate::error::{AppError, Result};
use crate::logger;

pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::{start_signal_handler, SignalHandler};

/// Serve HTTP until SIGINT/SIGTERM
///
/// Must run inside a `LocalSet`: connections are spawned with `spawn_local`.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let addr = state.config.get_socket_addr().map_err(AppError::Parse)?;
    let listener = create_listener(addr, state.config.server.backlog)?;
    logger::log_server_start(&addr, &state.config);

    let signals = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signals));

    start_server_loop(
        listener,
        state,
        Arc::new(AtomicUsize::new(0)),
        Arc::clone(&signals.shutdown),
    )
    .await;
    Ok(())
}
