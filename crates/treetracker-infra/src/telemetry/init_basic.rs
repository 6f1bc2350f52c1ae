use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use treetracker_core::CaptureConfig;

const DEFAULT_FILTER: &str = "treetracker=debug";

/// Initialize tracing with an `EnvFilter` (falls back to `treetracker=debug`).
///
/// Logs go to stderr so stdout stays free for command output. Production
/// environments log JSON lines, everything else uses the human-readable
/// formatter. Fails if a global subscriber is already installed.
pub fn init_telemetry(config: &CaptureConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    tracing::debug!(environment = %config.environment, "Tracing initialized");
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}
