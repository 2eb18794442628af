use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

/// Convert a Rust Result to a Python Result
///
/// Every client failure surfaces in Python as `RuntimeError` carrying the
/// error's display text.
pub fn to_pyresult<T, E: std::fmt::Display>(result: Result<T, E>) -> PyResult<T> {
    result.map_err(|e| PyErr::new::<PyRuntimeError, _>(format!("{}", e)))
}

/// Surface an exception raised by a Python callback once the client call
/// has returned, ahead of the call's own result.
pub fn with_callback_error<T>(result: PyResult<T>, callback_error: Option<PyErr>) -> PyResult<T> {
    match callback_error {
        Some(err) => Err(err),
        None => result,
    }
}

