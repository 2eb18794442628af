use pyo3::prelude::*;

mod client;
mod error;

use hdc_core::config::LoggingConfig;

use crate::error::to_pyresult;

/// Install the tracing subscriber used by the client.
///
/// `level` accepts a level name or an EnvFilter directive such as
/// `"hdc_client=debug"`. `RUST_LOG` takes precedence when set. Raises
/// `RuntimeError` if logging was already initialized.
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn init_logging(level: &str) -> PyResult<()> {
    let config = LoggingConfig {
        level: level.to_string(),
    };
    to_pyresult(hdc_core::logging::init_from_config(&config))
}

/// Python bindings for the HarmonyOS Device Connector (HDC) client.
#[pymodule]
fn pyhdc(m: &Bound<'_, PyModule>) -> PyResult<()> {
    client::register_client(m)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
