//! Runtime management for the blocking transport.
//!
//! Every [`BlockingTransport`](crate::transport::BlockingTransport) needs a
//! reactor to drive its socket. Unless one is supplied explicitly, the
//! transport uses the process-wide runtime kept here.

use std::sync::OnceLock;

use tokio::runtime::{Handle, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Initialize the shared runtime.
///
/// Calling this early is optional; the runtime is created on first use
/// otherwise.
pub fn init() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tracing::debug!(target: "courier::runtime", "Starting shared tokio runtime");
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("courier-reactor")
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// Get a reference to the shared runtime.
pub fn get() -> &'static Runtime {
    init()
}

/// Get a handle to the shared runtime.
pub fn handle() -> Handle {
    get().handle().clone()
}
