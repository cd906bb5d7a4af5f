pub mod config;
pub mod error;

pub use config::{Config, TemperatureUnit, ValidationResult, WeatherConfig};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::Result;

/// Initialize logging for the application.
///
/// `RUST_LOG` overrides the default `info` filter. Logs go to stderr so
/// stdout carries only program output. Calling this twice is harmless; the
/// second subscriber is simply not installed.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("SkyCast core initialized");
    }
    Ok(())
}
