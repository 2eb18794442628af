//! Sets up a port forward, pushes a file and tails the device log.

use hdc_client::{FileTransferOptions, ForwardNode, HdcClient};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut client = HdcClient::connect("127.0.0.1:8710").await?;
    let device = client.wait_for_device().await?;
    client.connect_device(&device).await?;

    let result = client
        .fport(ForwardNode::parse("tcp:9222")?, ForwardNode::parse("tcp:9222")?)
        .await?;
    info!("fport: {}", result.trim());

    for task in client.fport_list().await? {
        info!("forward task: {}", task);
    }

    let local = std::env::temp_dir().join("hdc_example.txt");
    std::fs::write(&local, "hello from the host\n")?;
    let output = client
        .file_send(
            &local.to_string_lossy(),
            "/data/local/tmp/hdc_example.txt",
            FileTransferOptions::new().compress(true),
        )
        .await?;
    info!("file send: {}", output.trim());

    let mut chunks = 0;
    client
        .hilog_stream(None, |chunk| {
            print!("{}", chunk);
            chunks += 1;
            chunks < 20
        })
        .await?;

    if let Err(e) = client.fport_remove("tcp:9222 tcp:9222").await {
        warn!("Failed to remove forward: {}", e);
    }
    Ok(())
}
