//! Broadcast UDP socket for discovery
//!
//! Discovery never touches a session: probes go to the local broadcast
//! address and every device on the segment answers with its identity.

use std::net::{Ipv4Addr, SocketAddr};

use bytes::BytesMut;
use dvrip_core::Packet;
use tokio::net::UdpSocket;
use tracing::trace;

use crate::error::{Error, Result};

const MAX_DATAGRAM: usize = 8 * 1024;

/// One-shot broadcast probe socket
pub struct DiscoverySocket {
    socket: UdpSocket,
}

impl DiscoverySocket {
    /// Bind an ephemeral local port with broadcast permission.
    pub async fn bind() -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(Error::Io)?;
        socket.set_broadcast(true)?;
        Ok(Self { socket })
    }

    /// Broadcast one probe frame to `port` on the local segment.
    pub async fn send_probe(&self, packet: &Packet, port: u16) -> Result<()> {
        let data = packet.encode();
        trace!("broadcasting {} byte probe to port {}", data.len(), port);
        self.socket
            .send_to(&data, (Ipv4Addr::BROADCAST, port))
            .await?;
        Ok(())
    }

    /// Receive and decode one reply datagram.
    ///
    /// A datagram shorter than its declared frame length can never be
    /// completed and is reported as [`Error::TruncatedDatagram`].
    pub async fn recv_reply(&self) -> Result<(Packet, SocketAddr)> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, from) = self.socket.recv_from(&mut buf).await?;

        trace!("received {} byte reply from {}", n, from);

        let mut bytes = BytesMut::from(&buf[..n]);
        match Packet::decode(&mut bytes)? {
            Some(packet) => Ok((packet, from)),
            None => Err(Error::TruncatedDatagram),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvrip_core::MessageType;

    #[tokio::test]
    async fn test_bind_ephemeral() {
        let socket = DiscoverySocket::bind().await.unwrap();
        assert_ne!(socket.socket.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_reply_decode_over_loopback() {
        let receiver = DiscoverySocket::bind().await.unwrap();
        let port = receiver.socket.local_addr().unwrap().port();

        let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let reply = Packet::with_payload(
            MessageType::DiscoverReply,
            0,
            0,
            &br#"{"Ret":100}"#[..],
        );
        sender
            .send_to(&reply.encode(), (Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();

        let (packet, from) = receiver.recv_reply().await.unwrap();
        assert_eq!(packet, reply);
        assert_eq!(from.port(), sender.local_addr().unwrap().port());
    }

    #[tokio::test]
    async fn test_truncated_datagram() {
        let receiver = DiscoverySocket::bind().await.unwrap();
        let port = receiver.socket.local_addr().unwrap().port();

        let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let full = Packet::with_payload(
            MessageType::DiscoverReply,
            0,
            0,
            vec![0u8; 32],
        )
        .encode();
        // Chop the datagram mid-payload.
        sender
            .send_to(&full[..full.len() - 8], (Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();

        assert!(matches!(
            receiver.recv_reply().await,
            Err(Error::TruncatedDatagram)
        ));
    }
}
