//! Framed TCP control channel
//!
//! The control connection is split into an owned reader and writer so
//! a dedicated reader task can parse inbound frames while any number
//! of callers take turns writing.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::BytesMut;
use dvrip_core::Packet;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};

const READ_CHUNK: usize = 16 * 1024;

/// Reading half of a framed connection.
///
/// Accumulates raw bytes and yields complete frames; partial frames
/// stay buffered until the rest arrives.
pub struct FrameReader {
    inner: Box<dyn AsyncRead + Send + Unpin>,
    buf: BytesMut,
}

impl FrameReader {
    pub fn new(inner: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Read the next complete frame.
    ///
    /// Returns [`Error::ConnectionClosed`] on a clean EOF between
    /// frames; EOF in the middle of a frame reports the same error
    /// since the remainder can never arrive.
    pub async fn read_frame(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = Packet::decode(&mut self.buf)? {
                trace!("received {}", packet);
                return Ok(packet);
            }

            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }
}

/// Writing half of a framed connection.
pub struct FrameWriter {
    inner: Box<dyn AsyncWrite + Send + Unpin>,
}

impl FrameWriter {
    pub fn new(inner: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// Write one frame and flush it.
    pub async fn write_frame(&mut self, packet: &Packet) -> Result<()> {
        trace!("sending {}", packet);

        let data = packet.encode();
        self.inner.write_all(&data).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Gracefully shut down the write side.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// TCP control channel establishment
pub struct TcpTransport;

impl TcpTransport {
    /// Resolve `addr` and connect within `connect_timeout`.
    pub async fn connect(
        addr: &str,
        connect_timeout: Duration,
    ) -> Result<(FrameReader, FrameWriter)> {
        let resolved = Self::resolve(addr).await?;

        debug!("connecting to {}...", resolved);

        let stream = timeout(connect_timeout, TcpStream::connect(resolved))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;

        // Control exchanges are small; don't let Nagle delay them.
        stream.set_nodelay(true)?;

        debug!("connected to {}", resolved);

        let (read, write) = stream.into_split();
        Ok((FrameReader::new(read), FrameWriter::new(write)))
    }

    async fn resolve(addr: &str) -> Result<SocketAddr> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(addr)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{addr}: {e}")))?
            .collect();

        addrs
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidAddress(format!("no addresses found for {addr}")))
    }
}
