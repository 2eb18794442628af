/*!
 * Async HDC client.
 *
 * A client owns one TCP channel to the HDC server. The channel is bound to
 * a device by placing the device id in the handshake connect key, so
 * selecting a device means reconnecting.
 */
use std::io::ErrorKind;
use std::time::Duration;

use hdc_core::config::Config;
use hdc_core::utils::with_timeout;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn, Instrument};

use crate::app::{self, InstallOptions, UninstallOptions};
use crate::error::{HdcError, Result};
use crate::file::{self, FileTransferDirection, FileTransferOptions};
use crate::forward::{ForwardNode, ForwardTask};
use crate::monitor::{self, DeviceListTracker};
use crate::protocol::{ChannelHandShake, HdcCommand, PacketCodec};

/// Outcome of waiting for one response packet in a multi-packet exchange
enum Chunk {
    Data(String),
    /// The server sent an empty payload or closed the channel
    End,
    /// Nothing arrived within the idle timeout
    Idle,
}

/// HDC client for communicating with HDC server
pub struct HdcClient {
    stream: Option<TcpStream>,
    address: String,
    codec: PacketCodec,
    channel_id: u32,
    handshake_ok: bool,
    /// Device the channel is bound to
    connect_key: Option<String>,
    config: Config,
}

impl HdcClient {
    /// Create a new HDC client (not connected)
    pub fn new(address: impl Into<String>) -> Self {
        let mut config = Config::default();
        config.server.address = address.into();
        Self::with_config(config)
    }

    /// Create a new client from a configuration (not connected)
    pub fn with_config(config: Config) -> Self {
        Self {
            stream: None,
            address: config.server.address.clone(),
            codec: PacketCodec::new(),
            channel_id: 0,
            handshake_ok: false,
            connect_key: None,
            config,
        }
    }

    /// Connect to an HDC server at `address` (`host:port`)
    pub async fn connect(address: impl Into<String>) -> Result<Self> {
        let mut client = Self::new(address);
        client.open_channel(None).await?;
        Ok(client)
    }

    /// Connect using the server address and timeouts from `config`
    pub async fn connect_with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let mut client = Self::with_config(config.clone());
        client.open_channel(None).await?;
        Ok(client)
    }

    /// Open a fresh TCP channel and perform the handshake
    async fn open_channel(&mut self, connect_key: Option<&str>) -> Result<()> {
        self.stream = None;
        self.handshake_ok = false;

        debug!("Connecting to HDC server at {}", self.address);
        let address = self.address.clone();
        let stream = with_timeout(self.config.connect_timeout(), async move {
            TcpStream::connect(&address)
                .await
                .map_err(hdc_core::error::Error::Io)
        })
        .await?;
        self.stream = Some(stream);

        self.perform_handshake(connect_key).await
    }

    /// Perform channel handshake with server
    async fn perform_handshake(&mut self, connect_key: Option<&str>) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(HdcError::NotConnected)?;

        let handshake_data = self.codec.read_packet(stream).await?;
        let received_size = handshake_data.len();
        debug!("Received handshake: {} bytes", received_size);

        let mut handshake = ChannelHandShake::from_bytes(&handshake_data)?;
        handshake.verify_banner()?;

        self.channel_id = handshake.channel_id();
        debug!(
            "Assigned channel ID: {}, stable buffer: {}, server version: {:?}",
            self.channel_id,
            handshake.is_stable_buf(),
            handshake.version()
        );

        handshake.set_connect_key(connect_key.unwrap_or(""));

        // The reply mirrors the size the server chose
        let response = if received_size >= ChannelHandShake::SIZE {
            handshake.to_bytes()
        } else {
            handshake.to_bytes_without_version()
        };
        self.codec.write_packet(stream, &response).await?;

        self.connect_key = connect_key.map(str::to_string);
        self.handshake_ok = true;
        info!(
            "Channel {} ready{}",
            self.channel_id,
            connect_key
                .map(|key| format!(" for device {}", key))
                .unwrap_or_default()
        );

        Ok(())
    }

    /// Channel ID assigned by the server
    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    /// Whether the channel handshake is complete
    pub fn is_connected(&self) -> bool {
        self.handshake_ok && self.stream.is_some()
    }

    /// Device the channel is currently bound to
    pub fn current_target(&self) -> Option<&str> {
        self.connect_key.as_deref()
    }

    /// Server address this client talks to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send a raw command string such as `list targets` or `shell ls`
    pub async fn send_command(&mut self, command: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(HdcError::NotConnected);
        }
        let stream = self.stream.as_mut().ok_or(HdcError::NotConnected)?;
        debug!("Sending command: {}", command);
        self.codec.write_packet(stream, command.as_bytes()).await
    }

    /// Read one raw response packet
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        if !self.is_connected() {
            return Err(HdcError::NotConnected);
        }
        let stream = self.stream.as_mut().ok_or(HdcError::NotConnected)?;
        self.codec.read_packet(stream).await
    }

    /// Read one response packet as text, without its command prefix
    pub async fn read_response_string(&mut self) -> Result<String> {
        let data = self.read_response().await?;

        match HdcCommand::split_prefix(&data) {
            Some((command, rest)) => {
                debug!("Response has command prefix: {:?}", command);
                Ok(String::from_utf8(rest.to_vec())?)
            }
            None => Ok(String::from_utf8(data)?),
        }
    }

    /// Wait up to `idle` for the next packet of a multi-packet response
    async fn next_chunk(&mut self, idle: Duration) -> Result<Chunk> {
        match timeout(idle, self.read_response_string()).await {
            Err(_) => {
                self.reset_channel().await;
                Ok(Chunk::Idle)
            }
            Ok(Ok(text)) if text.is_empty() => Ok(Chunk::End),
            Ok(Ok(text)) => Ok(Chunk::Data(text)),
            Ok(Err(HdcError::Io(e))) if e.kind() == ErrorKind::UnexpectedEof => {
                debug!("Server closed channel {}", self.channel_id);
                self.stream = None;
                self.handshake_ok = false;
                Ok(Chunk::End)
            }
            Ok(Err(e)) => Err(e),
        }
    }

    /// Replace the channel after a read timed out.
    ///
    /// The cancelled read may have consumed part of a packet, and a late reply
    /// would be taken as the answer to the next command. The new channel is
    /// bound to the same device; a failed reconnect leaves the client
    /// disconnected.
    async fn reset_channel(&mut self) {
        debug!("Discarding channel {} after read timeout", self.channel_id);
        let device = self.connect_key.clone();
        self.stream = None;
        self.handshake_ok = false;

        if let Err(e) = self.open_channel(device.as_deref()).await {
            warn!("Failed to reopen channel after timeout: {}", e);
        }
    }

    /// Collect response packets until `is_complete` matches a chunk, the
    /// server ends the response, or the channel stays idle.
    async fn collect_output(
        &mut self,
        idle: Duration,
        is_complete: fn(&str) -> bool,
        operation: &str,
    ) -> Result<String> {
        let mut output = String::new();
        loop {
            match self.next_chunk(idle).await? {
                Chunk::Data(text) => {
                    output.push_str(&text);
                    if is_complete(&text) {
                        break;
                    }
                }
                Chunk::End => break,
                Chunk::Idle if output.is_empty() => {
                    warn!("Timeout waiting for {} response", operation);
                    return Err(HdcError::Timeout);
                }
                Chunk::Idle => break,
            }
        }
        debug!("{} output: {} bytes", operation, output.len());
        Ok(output)
    }

    /// Open a temporary server channel, run one command and read one response
    async fn server_command(&self, command: &str) -> Result<String> {
        let mut temp = Self::with_config(self.config.clone());
        temp.open_channel(None).await?;
        temp.send_command(command).await?;
        temp.read_response_string().await
    }

    /// Bind the client to a device.
    ///
    /// Reconnects with `device_id` as the handshake connect key; every later
    /// command runs on that device.
    pub async fn connect_device(&mut self, device_id: &str) -> Result<()> {
        if device_id.is_empty() {
            return Err(HdcError::invalid_argument("device id must not be empty"));
        }
        if device_id.len() > ChannelHandShake::MAX_CONNECT_KEY_LEN {
            return Err(HdcError::invalid_argument(format!(
                "device id {:?} is longer than {} bytes",
                device_id,
                ChannelHandShake::MAX_CONNECT_KEY_LEN
            )));
        }
        info!("Connecting to device: {}", device_id);
        self.open_channel(Some(device_id)).await
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        if self.stream.take().is_some() {
            info!("Closing channel {}", self.channel_id);
        }
        self.handshake_ok = false;
        Ok(())
    }

    // ========== Device commands ==========

    /// List connected devices/targets
    pub async fn list_targets(&mut self) -> Result<Vec<String>> {
        self.send_command("list targets").await?;

        let response = self.read_response_string().await?;
        debug!("List targets response: {:?}", response);

        let devices = monitor::parse_target_list(&response);
        info!("Found {} device(s)", devices.len());
        Ok(devices)
    }

    /// Check the server version
    pub async fn check_server(&mut self) -> Result<String> {
        self.send_command("checkserver").await?;
        let response = self.read_response_string().await?;
        debug!("Server version: {}", response);
        Ok(response.trim().to_string())
    }

    /// Wait until any device is connected and return its id
    ///
    /// Returns immediately when a device is already connected.
    pub async fn wait_for_device(&mut self) -> Result<String> {
        info!("Waiting for device...");
        self.send_command("wait").await?;

        let response = self.read_response_string().await?;
        debug!("Wait for device response: {}", response);
        Ok(monitor::parse_wait_response(&response))
    }

    /// Poll the device list and report changes.
    ///
    /// Each poll uses a fresh server channel because the server closes the
    /// channel after answering. The callback receives the new list whenever
    /// it differs from the previous poll; returning `false` stops monitoring.
    /// Failed polls are logged and retried after `interval`, which must be
    /// non-zero.
    pub async fn monitor_devices<F>(&mut self, interval: Duration, mut callback: F) -> Result<()>
    where
        F: FnMut(&[String]) -> bool,
    {
        if interval.is_zero() {
            return Err(HdcError::invalid_argument(
                "monitor interval must be greater than 0",
            ));
        }
        let span = hdc_core::logging::operation_span("monitor_devices", &self.address);
        async {
            info!("Starting device monitoring with interval: {:?}", interval);
            let mut tracker = DeviceListTracker::new();

            loop {
                let mut poller = Self::with_config(self.config.clone());
                let polled = match poller.open_channel(None).await {
                    Ok(()) => poller.list_targets().await,
                    Err(e) => Err(e),
                };

                match polled {
                    Ok(devices) => {
                        if let Some(changed) = tracker.update(devices) {
                            debug!("Device list changed: {:?}", changed);
                            if !callback(changed) {
                                info!("Device monitoring stopped by callback");
                                break;
                            }
                        }
                    }
                    Err(e) => warn!("Device poll failed: {}", e),
                }

                tokio::time::sleep(interval).await;
            }

            Ok(())
        }
        .instrument(span)
        .await
    }

    // ========== Shell ==========

    /// Execute a shell command and return its output.
    ///
    /// The server consumes the channel for the shell, so when a device is
    /// selected the client reconnects to it afterwards. A failed reconnect is
    /// logged and does not fail the command.
    pub async fn shell(&mut self, cmd: &str) -> Result<String> {
        if cmd.trim().is_empty() {
            return Err(HdcError::invalid_argument("shell command must not be empty"));
        }
        info!("Executing shell command: {}", cmd);

        let device_id = self.connect_key.clone();
        self.send_command(&format!("shell {}", cmd)).await?;

        let data = match timeout(self.config.timeouts.shell(), self.read_response()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Timeout reading shell response");
                self.reset_channel().await;
                return Err(HdcError::Timeout);
            }
        };
        let payload = HdcCommand::split_prefix(&data)
            .map(|(_, rest)| rest)
            .unwrap_or(&data);
        let output = String::from_utf8_lossy(payload).into_owned();
        debug!("Shell response: {} bytes", output.len());

        if let Some(device) = device_id {
            debug!("Reconnecting to device {} after shell command", device);
            if let Err(e) = self.open_channel(Some(&device)).await {
                warn!("Failed to reconnect after shell: {}", e);
            }
        }

        Ok(output)
    }

    /// Bind to `device_id`, then run `cmd` as a shell command there
    pub async fn shell_on_device(&mut self, device_id: &str, cmd: &str) -> Result<String> {
        self.connect_device(device_id).await?;
        self.shell(cmd).await
    }

    /// Bind to `device_id`, then send a raw command and read one response
    pub async fn target_command(&mut self, device_id: &str, cmd: &str) -> Result<String> {
        info!("Executing target command on {}: {}", device_id, cmd);
        self.connect_device(device_id).await?;
        self.send_command(cmd).await?;
        self.read_response_string().await
    }

    // ========== Forward commands ==========

    /// Forward host traffic on `local` to `remote` on the device (fport)
    pub async fn fport(&mut self, local: ForwardNode, remote: ForwardNode) -> Result<String> {
        self.forward(&ForwardTask::forward(local, remote)).await
    }

    /// Forward device traffic on `remote` to `local` on the host (rport)
    pub async fn rport(&mut self, remote: ForwardNode, local: ForwardNode) -> Result<String> {
        self.forward(&ForwardTask::reverse(remote, local)).await
    }

    /// Create the mapping described by `task`
    pub async fn forward(&mut self, task: &ForwardTask) -> Result<String> {
        if task.local_node.is_remote_only() {
            return Err(HdcError::invalid_argument(format!(
                "{} can only be used on the device side",
                task.local_node
            )));
        }

        let cmd = task.to_command_string();
        info!("Creating forward: {}", cmd);
        self.send_command(&cmd).await?;

        let response = self.read_response_string().await?;
        debug!("Forward response: {}", response);
        if response.starts_with("[Fail]") {
            return Err(HdcError::command_failed(response.trim()));
        }
        Ok(response)
    }

    /// List forward and reverse tasks across all devices
    pub async fn fport_list(&mut self) -> Result<Vec<String>> {
        info!("Listing forward tasks");
        let response = self.server_command("fport ls").await?;
        debug!("Forward list response: {}", response);

        if response.starts_with("[Fail]") {
            return Err(HdcError::command_failed(response.trim()));
        }

        Ok(response
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != "[Empty]")
            .map(str::to_string)
            .collect())
    }

    /// Remove a forward task by its task string (`"tcp:8080 tcp:8081"`)
    pub async fn fport_remove(&mut self, task_str: &str) -> Result<String> {
        if task_str.trim().is_empty() {
            return Err(HdcError::invalid_argument("task string must not be empty"));
        }
        info!("Removing forward task: {}", task_str);
        let response = self.server_command(&format!("fport rm {}", task_str)).await?;
        debug!("Remove forward response: {}", response);

        if response.starts_with("[Fail]") {
            return Err(HdcError::command_failed(response.trim()));
        }
        Ok(response)
    }

    // ========== App commands ==========

    /// Install application package(s) (.hap, .hsp or directories)
    pub async fn install(&mut self, paths: &[&str], options: InstallOptions) -> Result<String> {
        if paths.is_empty() {
            return Err(HdcError::invalid_argument("no package paths given"));
        }
        for path in paths {
            file::validate_path(path)?;
        }
        info!("Installing {:?} with options {:?}", paths, options);

        let cmd = command_line("install", &options.to_flags(), paths);
        self.send_command(&cmd).await?;

        self.collect_output(
            self.config.timeouts.install(),
            app::is_install_complete,
            "install",
        )
        .await
    }

    /// Uninstall an application by bundle name
    pub async fn uninstall(&mut self, package: &str, options: UninstallOptions) -> Result<String> {
        if package.trim().is_empty() {
            return Err(HdcError::invalid_argument("package name must not be empty"));
        }
        info!("Uninstalling {} with options {:?}", package, options);

        let cmd = command_line("uninstall", &options.to_flags(), &[package]);
        self.send_command(&cmd).await?;

        let response = self.read_response_string().await?;
        debug!("Uninstall response: {}", response);
        Ok(response)
    }

    // ========== Logs ==========

    /// Read device logs (hilog) until the stream goes idle
    ///
    /// `args` are passed through to hilog, e.g. `"-t app"` or `"-x"`.
    pub async fn hilog(&mut self, args: Option<&str>) -> Result<String> {
        info!("Reading hilog: {:?}", args);
        self.send_command(&hilog_command(args)).await?;
        self.collect_output(self.config.timeouts.hilog(), |_| false, "hilog")
            .await
    }

    /// Stream device logs into `callback` chunk by chunk.
    ///
    /// Stops when the callback returns `false`, the server ends the stream,
    /// or no data arrives within the stream timeout.
    pub async fn hilog_stream<F>(&mut self, args: Option<&str>, mut callback: F) -> Result<()>
    where
        F: FnMut(&str) -> bool,
    {
        info!("Starting hilog stream: {:?}", args);
        self.send_command(&hilog_command(args)).await?;

        let idle = self.config.timeouts.hilog_stream();
        loop {
            match self.next_chunk(idle).await? {
                Chunk::Data(text) => {
                    if !callback(&text) {
                        info!("Hilog stream stopped by callback");
                        break;
                    }
                }
                Chunk::End => break,
                Chunk::Idle => {
                    warn!("Hilog stream idle for {:?}, stopping", idle);
                    break;
                }
            }
        }

        Ok(())
    }

    // ========== File transfer ==========

    /// Send a local file to the device
    pub async fn file_send(
        &mut self,
        local_path: &str,
        remote_path: &str,
        options: FileTransferOptions,
    ) -> Result<String> {
        self.file_transfer(FileTransferDirection::Send, local_path, remote_path, options)
            .await
    }

    /// Receive a file from the device
    pub async fn file_recv(
        &mut self,
        remote_path: &str,
        local_path: &str,
        options: FileTransferOptions,
    ) -> Result<String> {
        self.file_transfer(FileTransferDirection::Recv, remote_path, local_path, options)
            .await
    }

    async fn file_transfer(
        &mut self,
        direction: FileTransferDirection,
        source: &str,
        destination: &str,
        options: FileTransferOptions,
    ) -> Result<String> {
        file::validate_path(source)?;
        file::validate_path(destination)?;

        let cmd = command_line(
            &format!("file {}", direction.as_str()),
            &options.to_flags(),
            &[source, destination],
        );
        info!("File transfer: {}", cmd);
        self.send_command(&cmd).await?;

        self.collect_output(
            self.config.timeouts.file_transfer(),
            file::is_transfer_complete,
            "file transfer",
        )
        .await
    }
}

impl Drop for HdcClient {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("HdcClient dropped, closing channel {}", self.channel_id);
        }
    }
}

/// Join a verb, its flags and its operands into one command line
fn command_line(verb: &str, flags: &str, operands: &[&str]) -> String {
    let mut parts = vec![verb];
    if !flags.is_empty() {
        parts.push(flags);
    }
    parts.extend_from_slice(operands);
    parts.join(" ")
}

fn hilog_command(args: Option<&str>) -> String {
    match args.map(str::trim) {
        Some(args) if !args.is_empty() => format!("hilog {}", args),
        _ => "hilog".to_string(),
    }
}
