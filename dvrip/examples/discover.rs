//! Scan the local network for DVRIP devices

use std::time::Duration;

#[tokio::main]
async fn main() -> dvrip::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("Scanning local network (2s)...");
    let devices = dvrip::discover(Duration::from_secs(2)).await?;

    if devices.is_empty() {
        println!("No devices answered.");
        return Ok(());
    }

    for device in devices {
        println!(
            "{:<20} {:<18} {} ({} channels)",
            device.serial,
            device.control_addr(),
            device.host.name,
            device.host.channels,
        );
    }

    Ok(())
}
