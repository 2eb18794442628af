//! Watches device connections with the blocking client.
//!
//! Run with `cargo run --example device_monitor -- <seconds>`; defaults to 30.

use std::time::{Duration, Instant};

use hdc_client::blocking::HdcClient;

fn main() -> anyhow::Result<()> {
    hdc_core::logging::init()?;

    let seconds = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(30);
    let deadline = Instant::now() + Duration::from_secs(seconds);

    let mut client = HdcClient::connect(hdc_core::config::DEFAULT_SERVER_ADDRESS)?;
    let interval = client.config().monitor.interval_secs;

    println!("Monitoring devices for {}s", seconds);
    client.monitor_devices(interval, |devices| {
        if devices.is_empty() {
            println!("No devices connected");
        } else {
            println!("Devices: {}", devices.join(", "));
        }
        Instant::now() < deadline
    })?;

    Ok(())
}
