pub mod config;
pub mod error;

pub use config::{Config, LoggingConfig, ServiceConfig, UiConfig, ValidationResult};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt};

use anyhow::Result;

/// Initialize logging.
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init(default_filter: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!("taskdash core initialized");
    Ok(())
}
