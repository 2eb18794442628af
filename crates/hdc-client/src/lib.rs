/*!
 * HDC Client
 *
 * Client for the HarmonyOS Device Connector (HDC) server. It speaks the
 * length-prefixed channel protocol over TCP and exposes device listing,
 * shell execution, port forwarding, app install, hilog and file transfer.
 *
 * ```no_run
 * use hdc_client::HdcClient;
 *
 * # async fn run() -> hdc_client::Result<()> {
 * let mut client = HdcClient::connect("127.0.0.1:8710").await?;
 * for device in client.list_targets().await? {
 *     client.connect_device(&device).await?;
 *     println!("{}", client.shell("uname -a").await?);
 * }
 * # Ok(())
 * # }
 * ```
 */

#![warn(missing_docs)]

pub mod app;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod client;
pub mod error;
pub mod file;
pub mod forward;
pub mod monitor;
pub mod protocol;

#[cfg(test)]
mod test_server;

pub use app::{InstallOptions, UninstallOptions};
pub use client::HdcClient;
pub use error::{HdcError, Result};
pub use file::{FileTransferDirection, FileTransferOptions};
pub use forward::{ForwardDirection, ForwardNode, ForwardTask};
pub use monitor::DeviceListTracker;

/// HDC client crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
