use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize diagnostics logging.
///
/// Diagnostics (connection lifecycle, bind/listen, child process events) go
/// through `tracing` and default to `warn` unless `RUST_LOG` says otherwise.
/// The protocol trace itself is program output and does not pass through
/// here; see [`crate::core::trace::TraceLog`].
pub fn init_logging() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| crate::Error::Setup(format!("failed to initialize logging: {e}")))?;

    Ok(())
}
