//! Broadcast device discovery
//!
//! Sessionless: one probe frame goes to the local broadcast address on
//! the discovery port and every DVRIP device on the segment announces
//! itself. Devices with several interfaces answer once per interface;
//! replies are deduplicated by serial number.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use dvrip_core::{MessageType, Packet, DISCOVERY_PORT};
use dvrip_transport::DiscoverySocket;
use dvrip_types::{DiscoverReply, DiscoveredDevice};
use tracing::{debug, warn};

use crate::error::Result;

/// Scan the local network segment for devices.
///
/// Collects replies until `timeout` elapses; devices that answer more
/// than once appear a single time. An empty result is normal on a
/// segment with no devices.
///
/// # Examples
///
/// ```no_run
/// # async fn demo() -> dvrip::Result<()> {
/// use std::time::Duration;
///
/// for device in dvrip::discover(Duration::from_secs(2)).await? {
///     println!("{} at {}", device.serial, device.control_addr());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn discover(timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
    let socket = DiscoverySocket::bind().await?;
    let probe = Packet::new(MessageType::Discover, 0, 0);
    socket.send_probe(&probe, DISCOVERY_PORT).await?;

    let mut collector = ReplyCollector::default();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let reply = tokio::time::timeout_at(deadline, socket.recv_reply()).await;
        match reply {
            Err(_) => break, // window over
            Ok(Ok((packet, from))) => collector.absorb(&packet, from),
            Ok(Err(e)) => {
                debug!("discarding unreadable datagram: {e}");
            }
        }
    }

    let devices = collector.finish();
    debug!("discovery found {} device(s)", devices.len());
    Ok(devices)
}

/// Accumulates discovery replies, dropping malformed datagrams and
/// duplicate serials.
#[derive(Default)]
struct ReplyCollector {
    seen: HashSet<String>,
    devices: Vec<DiscoveredDevice>,
}

impl ReplyCollector {
    fn absorb(&mut self, packet: &Packet, from: SocketAddr) {
        if packet.kind() != Some(MessageType::DiscoverReply) {
            debug!("ignoring non-discovery frame from {from}");
            return;
        }
        let reply = match parse_reply(packet) {
            Ok(reply) => reply,
            Err(e) => {
                // A hostile or broken device must not end the scan.
                warn!("malformed discovery reply from {from}: {e}");
                return;
            }
        };
        if !self.seen.insert(reply.host.serial.clone()) {
            return;
        }
        self.devices.push(DiscoveredDevice {
            source: from,
            serial: reply.host.serial.clone(),
            host: reply.host,
        });
    }

    fn finish(self) -> Vec<DiscoveredDevice> {
        self.devices
    }
}

fn parse_reply(packet: &Packet) -> Result<DiscoverReply> {
    let mut body = packet.payload.to_vec();
    while matches!(body.last(), Some(0x00) | Some(b'\\')) {
        body.pop();
    }
    Ok(serde_json::from_slice(&body)?)
}
