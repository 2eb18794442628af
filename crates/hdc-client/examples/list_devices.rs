//! Lists connected devices and prints basic information for each one.
//!
//! Settings come from `hdc.toml` when present and `HDC__*` environment
//! variables, e.g. `HDC__SERVER__ADDRESS=127.0.0.1:8710`.

use anyhow::Context;
use hdc_client::HdcClient;
use hdc_core::config::ConfigBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut builder = ConfigBuilder::new().with_environment_prefix("HDC");
    if std::path::Path::new("hdc.toml").exists() {
        builder = builder.with_config_file("hdc.toml");
    }
    let config = builder.build()?;
    hdc_core::logging::init_from_config(&config.logging)?;

    let mut client = HdcClient::connect_with_config(&config)
        .await
        .with_context(|| format!("connecting to {}", config.server.address))?;
    info!("Server: {}", client.check_server().await?);

    let devices = client.list_targets().await?;
    if devices.is_empty() {
        println!("No devices connected");
        return Ok(());
    }

    for device in &devices {
        client.connect_device(device).await?;
        let model = client.shell("param get const.product.model").await?;
        let version = client.shell("param get const.product.software.version").await?;
        println!("{}\t{}\t{}", device, model.trim(), version.trim());
    }

    client.close().await?;
    Ok(())
}
