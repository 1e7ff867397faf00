//! Tracing subscriber setup.

use crate::config::EditorConfig;
use crate::error::{AasxError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a global subscriber filtering at `level`. `RUST_LOG` takes
/// precedence when set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| AasxError::internal(format!("Failed to initialize logging: {}", e)))
}

/// Install a subscriber using the configured log level.
pub fn init_from_config(config: &EditorConfig) -> Result<()> {
    init_tracing(&config.general.log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let _ = init_tracing("debug");
        assert!(init_tracing("info").is_err());
    }
}
