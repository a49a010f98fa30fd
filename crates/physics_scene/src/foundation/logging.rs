//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Honours `RUST_LOG` when set, otherwise logs at `default_filter`
/// (for example `"info"` or `"physics_scene=debug"`). Calling this more
/// than once is harmless; later calls are ignored.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::trace!("Logger already initialized");
    }
}
