use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the relay.
///
/// `debug` lowers our own crates to `debug`; `RUST_LOG` always wins.
pub fn init(service_name: &str, debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };
    let crate_name = service_name.replace('-', "_");

    // Default: info for everything, `level` for our crates.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,alertgram_core={level},alertgram_http={level},alertgram_telegram={level},{crate_name}={level}"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install log subscriber: {e}")))?;

    Ok(())
}
