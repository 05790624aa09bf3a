//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the level is `info`, or `debug`
//! with `--debug`.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Fails if one is already installed.
pub fn init(debug: bool, json: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry.with(fmt::layer().json().with_target(false)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
