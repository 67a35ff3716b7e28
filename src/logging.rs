// Logging
// tracing-subscriber setup for the binary; the library only emits events

use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr subscriber. `RUST_LOG` wins over `level`; `verbose`
/// raises the crate's own events to debug and shows targets.
pub fn init(level: &str, verbose: bool) -> anyhow::Result<()> {
    let default_directive = if verbose {
        format!("{level},album_sync=debug")
    } else {
        level.to_string()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_directive))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
