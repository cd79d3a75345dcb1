//! Log in and print device identity and clock

use dvrip::Client;

#[tokio::main]
async fn main() -> dvrip::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let addr = std::env::var("DEVICE_ADDR")
        .unwrap_or_else(|_| "192.168.1.10:34567".to_string());
    let user = std::env::var("DEVICE_USER").unwrap_or_else(|_| "admin".to_string());
    let pass = std::env::var("DEVICE_PASS").unwrap_or_default();

    println!("Connecting to {addr}...");
    let mut client = Client::connect(addr).await?;
    client.login(&user, &pass).await?;
    println!("Logged in ({})", client.session_id());

    let info = client.system_info().await?;
    println!("Serial:   {}", info.serial);
    println!("Hardware: {}", info.hardware_version);
    println!("Software: {}", info.software_version);
    println!("Channels: {} in / {} out", info.video_in, info.video_out);
    println!("Uptime:   {} minutes", info.run_time_minutes);

    if let Some(time) = client.get_time().await?.0 {
        println!("Clock:    {time}");
    }

    client.close().await?;
    Ok(())
}
