//! Find yesterday's recordings on channel 0 and download the first one

use chrono::{Duration as ChronoDuration, Local};
use dvrip::{Client, FileKind};
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let addr = std::env::var("DEVICE_ADDR")
        .unwrap_or_else(|_| "192.168.1.10:34567".to_string());
    let user = std::env::var("DEVICE_USER").unwrap_or_else(|_| "admin".to_string());
    let pass = std::env::var("DEVICE_PASS").unwrap_or_default();

    let mut client = Client::connect(addr).await?;
    client.login(&user, &pass).await?;

    let end = Local::now().naive_local();
    let start = end - ChronoDuration::days(1);

    let files = client
        .find_files(start, end, 0, FileKind::Video)?
        .collect()
        .await?;
    println!("{} recording(s) in the last 24h", files.len());

    let Some(file) = files.first() else {
        client.close().await?;
        return Ok(());
    };
    println!("Downloading {} ({} bytes)...", file.name, file.size_bytes());

    let mut stream = client.open_download(file).await?;
    let mut out = tokio::fs::File::create("recording.h264").await?;
    while let Some(chunk) = stream.next().await? {
        out.write_all(&chunk).await?;
    }
    println!("Saved {} bytes to recording.h264", stream.bytes_read());

    client.close().await?;
    Ok(())
}
