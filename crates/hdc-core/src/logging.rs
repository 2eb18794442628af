/*!
 * Logging setup for the HDC client.
 *
 * Installs the `tracing` subscriber used by the examples and the Python
 * bindings, and provides the span the client wraps long-running operations in.
 */
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Initialize the logging system with default configuration
pub fn init() -> Result<()> {
    init_with_filter("info")
}

/// Initialize the logging system with a specific filter
///
/// `RUST_LOG` takes precedence over `filter` when it is set.
///
/// # Arguments
///
/// * `filter` - The log filter string (e.g., "info", "debug", "hdc_client=trace")
pub fn init_with_filter(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .map_err(|e| Error::runtime(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Initialize the logging system from a [`LoggingConfig`]
pub fn init_from_config(config: &LoggingConfig) -> Result<()> {
    init_with_filter(&config.level)
}

/// Create a new span for an operation
///
/// # Arguments
///
/// * `name` - The name of the operation
/// * `component` - The component performing the operation
pub fn operation_span(name: &str, component: &str) -> tracing::Span {
    tracing::info_span!("operation", name = %name, component = %component)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_fails() {
        // Only the first installation in a process can win
        let _ = init();
        assert!(matches!(init_with_filter("debug"), Err(Error::Runtime(_))));
    }

    #[test]
    fn test_operation_span_fields() {
        let span = operation_span("monitor_devices", "127.0.0.1:8710");
        let _guard = span.enter();

        let metadata = span.metadata().expect("span carries metadata");
        assert_eq!(metadata.name(), "operation");
        assert!(metadata.fields().field("name").is_some());
        assert!(metadata.fields().field("component").is_some());
    }
}
