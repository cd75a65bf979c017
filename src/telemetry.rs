//! Tracing initialization.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Stdout is reserved for results.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
  let env_filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(default_filter))
    .map_err(|e| anyhow::anyhow!("failed to create env filter: {e}"))?;

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
    .with(env_filter)
    .try_init()
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

  Ok(())
}
