/*!
 * Blocking HDC client.
 *
 * Wraps [`HdcClient`](crate::HdcClient) with a private tokio runtime so the
 * client can be used from synchronous code and from the Python bindings.
 */
use std::time::Duration;

use hdc_core::config::Config;
use tokio::runtime::{Builder, Runtime};

use crate::app::{InstallOptions, UninstallOptions};
use crate::error::Result;
use crate::file::FileTransferOptions;
use crate::forward::{ForwardNode, ForwardTask};

/// Blocking HDC client
///
/// Every method blocks the calling thread until the async operation
/// completes. Must not be used from inside an async runtime.
pub struct HdcClient {
    runtime: Runtime,
    inner: crate::HdcClient,
}

impl HdcClient {
    /// Connect to an HDC server at `address` (`host:port`)
    pub fn connect(address: &str) -> Result<Self> {
        let runtime = build_runtime()?;
        let inner = runtime.block_on(crate::HdcClient::connect(address))?;
        Ok(Self { runtime, inner })
    }

    /// Connect using the server address and timeouts from `config`
    pub fn connect_with_config(config: &Config) -> Result<Self> {
        let runtime = build_runtime()?;
        let inner = runtime.block_on(crate::HdcClient::connect_with_config(config))?;
        Ok(Self { runtime, inner })
    }

    /// Channel ID assigned by the server
    pub fn channel_id(&self) -> u32 {
        self.inner.channel_id()
    }

    /// Whether the channel handshake is complete
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Device the channel is currently bound to
    pub fn current_target(&self) -> Option<&str> {
        self.inner.current_target()
    }

    /// Server address this client talks to
    pub fn address(&self) -> &str {
        self.inner.address()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        self.inner.config()
    }

    /// Bind the client to a device
    pub fn connect_device(&mut self, device_id: &str) -> Result<()> {
        self.runtime.block_on(self.inner.connect_device(device_id))
    }

    /// Close the connection
    pub fn close(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.close())
    }

    /// Send a raw command string
    pub fn send_command(&mut self, command: &str) -> Result<()> {
        self.runtime.block_on(self.inner.send_command(command))
    }

    /// Read one raw response packet
    pub fn read_response(&mut self) -> Result<Vec<u8>> {
        self.runtime.block_on(self.inner.read_response())
    }

    /// Read one response packet as text
    pub fn read_response_string(&mut self) -> Result<String> {
        self.runtime.block_on(self.inner.read_response_string())
    }

    /// List connected devices
    pub fn list_targets(&mut self) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.list_targets())
    }

    /// Check the server version
    pub fn check_server(&mut self) -> Result<String> {
        self.runtime.block_on(self.inner.check_server())
    }

    /// Wait until any device is connected
    pub fn wait_for_device(&mut self) -> Result<String> {
        self.runtime.block_on(self.inner.wait_for_device())
    }

    /// Poll the device list every `interval_secs` seconds and report changes
    ///
    /// Returning `false` from the callback stops monitoring.
    pub fn monitor_devices<F>(&mut self, interval_secs: u64, callback: F) -> Result<()>
    where
        F: FnMut(&[String]) -> bool,
    {
        self.runtime.block_on(
            self.inner
                .monitor_devices(Duration::from_secs(interval_secs), callback),
        )
    }

    /// Execute a shell command on the current device
    pub fn shell(&mut self, cmd: &str) -> Result<String> {
        self.runtime.block_on(self.inner.shell(cmd))
    }

    /// Bind to `device_id`, then run a shell command there
    pub fn shell_on_device(&mut self, device_id: &str, cmd: &str) -> Result<String> {
        self.runtime
            .block_on(self.inner.shell_on_device(device_id, cmd))
    }

    /// Bind to `device_id`, then send a raw command and read one response
    pub fn target_command(&mut self, device_id: &str, cmd: &str) -> Result<String> {
        self.runtime
            .block_on(self.inner.target_command(device_id, cmd))
    }

    /// Forward a host node to a device node
    pub fn fport(&mut self, local: ForwardNode, remote: ForwardNode) -> Result<String> {
        self.runtime.block_on(self.inner.fport(local, remote))
    }

    /// Reverse-forward a device node to a host node
    pub fn rport(&mut self, remote: ForwardNode, local: ForwardNode) -> Result<String> {
        self.runtime.block_on(self.inner.rport(remote, local))
    }

    /// Create the mapping described by `task`
    pub fn forward(&mut self, task: &ForwardTask) -> Result<String> {
        self.runtime.block_on(self.inner.forward(task))
    }

    /// List forward and reverse tasks
    pub fn fport_list(&mut self) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.fport_list())
    }

    /// Remove a forward task
    pub fn fport_remove(&mut self, task_str: &str) -> Result<String> {
        self.runtime.block_on(self.inner.fport_remove(task_str))
    }

    /// Install application package(s)
    pub fn install(&mut self, paths: &[&str], options: InstallOptions) -> Result<String> {
        self.runtime.block_on(self.inner.install(paths, options))
    }

    /// Uninstall an application
    pub fn uninstall(&mut self, package: &str, options: UninstallOptions) -> Result<String> {
        self.runtime
            .block_on(self.inner.uninstall(package, options))
    }

    /// Read device logs until the stream goes idle
    pub fn hilog(&mut self, args: Option<&str>) -> Result<String> {
        self.runtime.block_on(self.inner.hilog(args))
    }

    /// Stream device logs into `callback`
    pub fn hilog_stream<F>(&mut self, args: Option<&str>, callback: F) -> Result<()>
    where
        F: FnMut(&str) -> bool,
    {
        self.runtime
            .block_on(self.inner.hilog_stream(args, callback))
    }

    /// Send a local file to the device
    pub fn file_send(
        &mut self,
        local_path: &str,
        remote_path: &str,
        options: FileTransferOptions,
    ) -> Result<String> {
        self.runtime
            .block_on(self.inner.file_send(local_path, remote_path, options))
    }

    /// Receive a file from the device
    pub fn file_recv(
        &mut self,
        remote_path: &str,
        local_path: &str,
        options: FileTransferOptions,
    ) -> Result<String> {
        self.runtime
            .block_on(self.inner.file_recv(remote_path, local_path, options))
    }
}

fn build_runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}
