use pyo3::prelude::*;
use pyo3::types::PyTuple;
use tracing::{debug, warn};

use hdc_client::blocking::HdcClient;
use hdc_client::{FileTransferOptions, ForwardNode, InstallOptions, UninstallOptions};
use hdc_core::config::DEFAULT_SERVER_ADDRESS;

use crate::error::{to_pyresult, with_callback_error};

/// Blocking connection to an HDC server.
///
/// Connects on construction. Every failure raises `RuntimeError`.
///
/// Example:
///     >>> client = HdcClient()
///     >>> for device in client.list_targets():
///     ...     client.connect_device(device)
///     ...     print(client.shell("uname -a"))
#[pyclass(name = "HdcClient", module = "pyhdc")]
pub struct PyHdcClient {
    inner: HdcClient,
}

#[pymethods]
impl PyHdcClient {
    #[new]
    #[pyo3(signature = (addr=DEFAULT_SERVER_ADDRESS))]
    fn new(py: Python<'_>, addr: &str) -> PyResult<Self> {
        let inner = to_pyresult(py.allow_threads(|| HdcClient::connect(addr)))?;
        Ok(Self { inner })
    }

    /// Server address this client talks to
    #[getter]
    fn address(&self) -> String {
        self.inner.address().to_string()
    }

    /// Channel ID assigned by the server
    fn channel_id(&self) -> u32 {
        self.inner.channel_id()
    }

    /// Device the session is bound to, or None
    fn current_target(&self) -> Option<String> {
        self.inner.current_target().map(str::to_string)
    }

    /// Whether the channel handshake is complete
    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// List connected device ids
    fn list_targets(&mut self, py: Python<'_>) -> PyResult<Vec<String>> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.list_targets()))
    }

    /// Bind this session to a device; later commands run on it
    fn connect_device(&mut self, py: Python<'_>, device_id: &str) -> PyResult<()> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.connect_device(device_id)))
    }

    /// Server version string
    fn check_server(&mut self, py: Python<'_>) -> PyResult<String> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.check_server()))
    }

    /// Block until a device is connected and return its id
    fn wait_for_device(&mut self, py: Python<'_>) -> PyResult<String> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.wait_for_device()))
    }

    /// Run a shell command on the current device
    fn shell(&mut self, py: Python<'_>, command: &str) -> PyResult<String> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.shell(command)))
    }

    /// Bind to `device_id` and run a shell command there
    fn shell_on_device(&mut self, py: Python<'_>, device_id: &str, command: &str) -> PyResult<String> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.shell_on_device(device_id, command)))
    }

    /// Bind to `device_id`, send a raw command and return the first response
    fn target_command(&mut self, py: Python<'_>, device_id: &str, command: &str) -> PyResult<String> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.target_command(device_id, command)))
    }

    /// Send a local file to the device
    ///
    /// Args:
    ///     local_path: File on the host
    ///     remote_path: Destination on the device
    ///     compress: Compress during transfer (-z)
    ///     hold_timestamp: Keep file timestamps (-a)
    ///     sync_mode: Only send newer files (-sync)
    ///     mode_sync: Sync file mode and ownership (-m)
    ///     debug_dir: Transfer into the app debug directory (-b)
    #[pyo3(signature = (local_path, remote_path, compress=false, hold_timestamp=false, sync_mode=false, mode_sync=false, debug_dir=false))]
    #[allow(clippy::too_many_arguments)]
    fn file_send(
        &mut self,
        py: Python<'_>,
        local_path: &str,
        remote_path: &str,
        compress: bool,
        hold_timestamp: bool,
        sync_mode: bool,
        mode_sync: bool,
        debug_dir: bool,
    ) -> PyResult<String> {
        let options = transfer_options(compress, hold_timestamp, sync_mode, mode_sync, debug_dir);
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.file_send(local_path, remote_path, options)))
    }

    /// Receive a file from the device; takes the same flags as `file_send`
    #[pyo3(signature = (remote_path, local_path, compress=false, hold_timestamp=false, sync_mode=false, mode_sync=false, debug_dir=false))]
    #[allow(clippy::too_many_arguments)]
    fn file_recv(
        &mut self,
        py: Python<'_>,
        remote_path: &str,
        local_path: &str,
        compress: bool,
        hold_timestamp: bool,
        sync_mode: bool,
        mode_sync: bool,
        debug_dir: bool,
    ) -> PyResult<String> {
        let options = transfer_options(compress, hold_timestamp, sync_mode, mode_sync, debug_dir);
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.file_recv(remote_path, local_path, options)))
    }

    /// Forward a host node to a device node, e.g. `fport("tcp:8080", "tcp:8080")`
    fn fport(&mut self, py: Python<'_>, local: &str, remote: &str) -> PyResult<String> {
        let local = to_pyresult(ForwardNode::parse(local))?;
        let remote = to_pyresult(ForwardNode::parse(remote))?;
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.fport(local, remote)))
    }

    /// Forward a device node to a host node
    fn rport(&mut self, py: Python<'_>, remote: &str, local: &str) -> PyResult<String> {
        let remote = to_pyresult(ForwardNode::parse(remote))?;
        let local = to_pyresult(ForwardNode::parse(local))?;
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.rport(remote, local)))
    }

    /// List forward and reverse tasks
    fn fport_list(&mut self, py: Python<'_>) -> PyResult<Vec<String>> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.fport_list()))
    }

    /// Remove a forward task, e.g. `fport_remove("tcp:8080 tcp:8080")`
    fn fport_remove(&mut self, py: Python<'_>, task_str: &str) -> PyResult<String> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.fport_remove(task_str)))
    }

    /// Install one or more .hap/.hsp packages
    #[pyo3(signature = (packages, replace=false, shared=false))]
    fn install(
        &mut self,
        py: Python<'_>,
        packages: Vec<String>,
        replace: bool,
        shared: bool,
    ) -> PyResult<String> {
        let options = InstallOptions::new().replace(replace).shared(shared);
        let paths: Vec<&str> = packages.iter().map(String::as_str).collect();
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.install(&paths, options)))
    }

    /// Uninstall an application by bundle name
    #[pyo3(signature = (package, keep_data=false, shared=false))]
    fn uninstall(
        &mut self,
        py: Python<'_>,
        package: &str,
        keep_data: bool,
        shared: bool,
    ) -> PyResult<String> {
        let options = UninstallOptions::new().keep_data(keep_data).shared(shared);
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.uninstall(package, options)))
    }

    /// Read device logs until the stream goes idle
    #[pyo3(signature = (args=None))]
    fn hilog(&mut self, py: Python<'_>, args: Option<&str>) -> PyResult<String> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.hilog(args)))
    }

    /// Stream device logs into `callback(chunk)`.
    ///
    /// Streaming stops when the callback returns a falsy value. An exception
    /// raised by the callback stops streaming and propagates.
    #[pyo3(signature = (callback, args=None))]
    fn hilog_stream(
        &mut self,
        py: Python<'_>,
        callback: PyObject,
        args: Option<&str>,
    ) -> PyResult<()> {
        let mut callback_error = None;
        let client = &mut self.inner;
        let result = py.allow_threads(|| {
            client.hilog_stream(args, |chunk| {
                invoke_callback(&callback, (chunk,), &mut callback_error)
            })
        });
        with_callback_error(to_pyresult(result), callback_error)
    }

    /// Poll the device list and call `callback(devices)` on every change.
    ///
    /// Monitoring stops when the callback returns a falsy value. An exception
    /// raised by the callback stops monitoring and propagates.
    #[pyo3(signature = (callback, interval_secs=2))]
    fn monitor_devices(
        &mut self,
        py: Python<'_>,
        callback: PyObject,
        interval_secs: u64,
    ) -> PyResult<()> {
        let mut callback_error = None;
        let client = &mut self.inner;
        let result = py.allow_threads(|| {
            client.monitor_devices(interval_secs, |devices| {
                invoke_callback(&callback, (devices.to_vec(),), &mut callback_error)
            })
        });
        with_callback_error(to_pyresult(result), callback_error)
    }

    /// Close the connection
    fn close(&mut self, py: Python<'_>) -> PyResult<()> {
        let client = &mut self.inner;
        to_pyresult(py.allow_threads(|| client.close()))
    }

    fn __enter__(slf: Py<Self>) -> Py<Self> {
        slf
    }

    #[pyo3(signature = (_exc_type=None, _exc_value=None, _traceback=None))]
    fn __exit__(
        &mut self,
        py: Python<'_>,
        _exc_type: Option<PyObject>,
        _exc_value: Option<PyObject>,
        _traceback: Option<PyObject>,
    ) -> PyResult<bool> {
        debug!("Leaving HdcClient context");
        self.close(py)?;
        Ok(false)
    }

    fn __repr__(&self) -> String {
        match self.inner.current_target() {
            Some(target) => format!(
                "HdcClient(address='{}', channel_id={}, target='{}')",
                self.inner.address(),
                self.inner.channel_id(),
                target
            ),
            None => format!(
                "HdcClient(address='{}', channel_id={})",
                self.inner.address(),
                self.inner.channel_id()
            ),
        }
    }
}

fn transfer_options(
    compress: bool,
    hold_timestamp: bool,
    sync_mode: bool,
    mode_sync: bool,
    debug_dir: bool,
) -> FileTransferOptions {
    FileTransferOptions::new()
        .compress(compress)
        .hold_timestamp(hold_timestamp)
        .sync_mode(sync_mode)
        .mode_sync(mode_sync)
        .debug_dir(debug_dir)
}

/// Call a Python callback with the GIL held and coerce its result to bool.
///
/// The first exception is stored in `error` and ends the loop.
fn invoke_callback<A>(callback: &PyObject, args: A, error: &mut Option<PyErr>) -> bool
where
    A: IntoPy<Py<PyTuple>>,
{
    Python::with_gil(|py| {
        match callback
            .call1(py, args)
            .and_then(|ret| ret.bind(py).is_truthy())
        {
            Ok(keep_going) => keep_going,
            Err(err) => {
                warn!("Python callback raised, stopping: {}", err);
                *error = Some(err);
                false
            }
        }
    })
}

/// Register the client class on the module
pub fn register_client(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyHdcClient>()?;
    Ok(())
}
