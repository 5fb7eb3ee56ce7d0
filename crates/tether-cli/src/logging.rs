use anyhow::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter (`EnvFilter` syntax).
pub const LOG_ENV: &str = "TETHER_LOG";

const DEFAULT_LEVEL: &str = "warn";

/// Install a stderr subscriber. Stdout carries hook replies, so logs never go
/// there.
pub fn init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("installing the tracing subscriber")?;
    Ok(())
}
