use crate::config::{LogFormat, LoggingSettings};
use crate::error::PipelineError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// results. `RUST_LOG`, when set, replaces the configured level.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(settings: &LoggingSettings) -> Result<(), PipelineError> {
    let filter = filter(settings);

    let result = match settings.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| PipelineError::Configuration(format!("logging: {}", e)))?;

    tracing::debug!("Logging initialized with level: {}", settings.level);
    Ok(())
}

fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
}
