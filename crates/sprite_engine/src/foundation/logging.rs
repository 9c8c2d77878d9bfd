//! Logging utilities

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// `default_filter` is used when `RUST_LOG` is not set. Calling this more
/// than once is harmless; later calls are ignored.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialised");
    }
}

/// Initialize the logging system
///
/// Routes records to the browser console. Later calls are ignored.
#[cfg(target_arch = "wasm32")]
pub fn init(default_filter: &str) {
    use std::sync::atomic::{AtomicBool, Ordering};

    static INSTALLED: AtomicBool = AtomicBool::new(false);
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let level = default_filter
        .parse::<log::Level>()
        .unwrap_or(log::Level::Info);
    wasm_logger::init(wasm_logger::Config::new(level));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init("debug");
        init("warn");
        info!("Logger still usable after a second init");
    }
}
