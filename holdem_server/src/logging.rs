//! Logging setup for the server binary.

use env_logger::{Builder, Env};

/// Filter used when `RUST_LOG` isn't set.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize `env_logger`, honoring `RUST_LOG` and falling back to
/// [`DEFAULT_FILTER`].
pub fn init() {
    builder().init();
}

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder.format_target(false);
    builder
}
