//! Discovery bodies (broadcast types 1530/1531)

use std::net::SocketAddr;

use dvrip_core::Status;
use serde::Deserialize;

use crate::encoding::{status, IpLe, SessionId};

/// Network block a device announces about itself
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    #[serde(rename = "SN", default)]
    pub serial: String,
    #[serde(rename = "MAC", default)]
    pub mac: String,
    #[serde(rename = "HostName", default)]
    pub name: String,
    #[serde(rename = "HostIP")]
    pub host_ip: IpLe,
    #[serde(rename = "Submask", default)]
    pub netmask: Option<IpLe>,
    #[serde(rename = "GateWay", default)]
    pub gateway: Option<IpLe>,
    #[serde(rename = "TCPPort", default)]
    pub tcp_port: u16,
    #[serde(rename = "UDPPort", default)]
    pub udp_port: u16,
    #[serde(rename = "HttpPort", default)]
    pub http_port: u16,
    #[serde(rename = "SSLPort", default)]
    pub https_port: u16,
    #[serde(rename = "ChannelNum", default)]
    pub channels: u32,
}

/// Discovery reply body (type 1531)
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverReply {
    #[serde(rename = "Ret", default = "default_ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "SessionID", default)]
    pub session: SessionId,
    #[serde(rename = "NetWork.NetCommon")]
    pub host: HostConfig,
}

fn default_ret() -> Status {
    Status::OK
}

/// One device seen on the local network.
///
/// Produced by a discovery scan; never persisted.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Address the reply actually came from
    pub source: SocketAddr,
    /// Announced serial number, the deduplication key
    pub serial: String,
    /// Announced identity and connection parameters
    pub host: HostConfig,
}

impl DiscoveredDevice {
    /// Control channel address advertised by the device.
    pub fn control_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host.host_ip.0.into(), self.host.tcp_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reply_parse() {
        let body = r#"{
            "NetWork.NetCommon": {
                "SN": "a1b2c3d4e5f60708",
                "MAC": "00:12:34:56:78:9a",
                "HostName": "LocalHost",
                "HostIP": "0x0A01A8C0",
                "Submask": "0x00FFFFFF",
                "GateWay": "0x0101A8C0",
                "TCPPort": 34567,
                "UDPPort": 34568,
                "HttpPort": 80,
                "ChannelNum": 4
            },
            "Ret": 100,
            "SessionID": "0x00000000"
        }"#;
        let reply: DiscoverReply = serde_json::from_str(body).unwrap();
        assert_eq!(reply.host.serial, "a1b2c3d4e5f60708");
        assert_eq!(reply.host.host_ip.to_string(), "192.168.1.10");
        assert_eq!(reply.host.tcp_port, 34567);
    }

    #[test]
    fn test_control_addr() {
        let body = r#"{
            "NetWork.NetCommon": {
                "SN": "x",
                "HostIP": "0x0A01A8C0",
                "TCPPort": 34567
            }
        }"#;
        let reply: DiscoverReply = serde_json::from_str(body).unwrap();
        let dev = DiscoveredDevice {
            source: "192.168.1.10:34568".parse().unwrap(),
            serial: reply.host.serial.clone(),
            host: reply.host,
        };
        assert_eq!(dev.control_addr().to_string(), "192.168.1.10:34567");
    }
}
