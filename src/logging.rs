//! Logging setup for the command line bridge.
//!
//! Everything goes to stderr; stdout carries only generated text or JSON.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global fmt subscriber. `RUST_LOG` wins over `verbose`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(verbose: bool) -> bool {
    let default_level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
