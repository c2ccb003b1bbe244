//! SSDP M-SEARCH plumbing
//!
//! Sends a multicast search for Sonos `ZonePlayer` devices and collects the
//! unicast replies until the socket read timeout elapses.

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::Duration;

use crate::error::{DiscoveryError, Result};

const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";
const ZONE_PLAYER_URN: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// One SSDP reply, reduced to the headers discovery cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SsdpReply {
    pub location: String,
    pub usn: String,
    pub server: Option<String>,
}

impl SsdpReply {
    /// Early filter before the (slow) description fetch: RINCON is the
    /// Sonos device id prefix, the server header names Sonos directly.
    pub fn looks_like_sonos(&self) -> bool {
        self.usn.contains("RINCON")
            || self
                .server
                .as_deref()
                .map(|s| s.to_ascii_lowercase().contains("sonos"))
                .unwrap_or(false)
    }
}

pub(crate) struct SsdpSearch {
    socket: UdpSocket,
}

impl SsdpSearch {
    /// Bind a UDP socket and send the M-SEARCH request. Replies are read
    /// with `recv` until the timeout elapses.
    pub fn start(timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| DiscoveryError::Network(format!("failed to bind UDP socket: {}", e)))?;
        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| DiscoveryError::Network(format!("failed to set read timeout: {}", e)))?;

        let request = format!(
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: {}\r\n\
             MAN: \"ssdp:discover\"\r\n\
             MX: 1\r\n\
             ST: {}\r\n\r\n",
            SSDP_MULTICAST_ADDR, ZONE_PLAYER_URN
        );
        socket
            .send_to(request.as_bytes(), SSDP_MULTICAST_ADDR)
            .map_err(|e| DiscoveryError::Network(format!("failed to send M-SEARCH: {}", e)))?;

        Ok(Self { socket })
    }

    /// Receive the next parseable reply. `Ok(None)` means the read timeout
    /// elapsed and the search is over.
    pub fn recv(&self) -> Result<Option<SsdpReply>> {
        let mut buf = [0u8; 2048];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, _)) => {
                    if let Some(reply) = std::str::from_utf8(&buf[..len])
                        .ok()
                        .and_then(parse_reply)
                    {
                        return Ok(Some(reply));
                    }
                    // Garbage datagram, keep listening.
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    return Ok(None);
                }
                Err(e) => return Err(DiscoveryError::Network(format!("socket error: {}", e))),
            }
        }
    }
}

fn parse_reply(text: &str) -> Option<SsdpReply> {
    let mut location = None;
    let mut usn = None;
    let mut server = None;

    for line in text.lines() {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.trim().to_ascii_uppercase().as_str() {
                "LOCATION" => location = Some(value.to_string()),
                "USN" => usn = Some(value.to_string()),
                "SERVER" => server = Some(value.to_string()),
                _ => {}
            }
        }
    }

    Some(SsdpReply {
        location: location?,
        usn: usn?,
        server,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const REPLY: &str = "HTTP/1.1 200 OK\r\n\
        LOCATION: http://192.168.4.21:1400/xml/device_description.xml\r\n\
        ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
        USN: uuid:RINCON_B8E937000000::urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
        SERVER: Linux UPnP/1.0 Sonos/77.4-50220\r\n\r\n";

    #[test]
    fn parses_complete_reply() {
        let reply = parse_reply(REPLY).unwrap();
        assert_eq!(
            reply.location,
            "http://192.168.4.21:1400/xml/device_description.xml"
        );
        assert!(reply.usn.starts_with("uuid:RINCON_B8E937000000"));
        assert_eq!(reply.server.as_deref(), Some("Linux UPnP/1.0 Sonos/77.4-50220"));
        assert!(reply.looks_like_sonos());
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let reply = parse_reply(
            "HTTP/1.1 200 OK\r\n\
             location: http://10.0.0.5:1400/desc.xml\r\n\
             usn: uuid:RINCON_000111222333\r\n\r\n",
        )
        .unwrap();
        assert_eq!(reply.location, "http://10.0.0.5:1400/desc.xml");
        assert!(reply.looks_like_sonos());
    }

    #[rstest]
    #[case("HTTP/1.1 200 OK\r\nUSN: uuid:x\r\n\r\n")] // no LOCATION
    #[case("HTTP/1.1 200 OK\r\nLOCATION: http://10.0.0.5:1400/d.xml\r\n\r\n")] // no USN
    #[case("")]
    #[case("not an ssdp reply at all")]
    fn incomplete_replies_are_dropped(#[case] text: &str) {
        assert!(parse_reply(text).is_none());
    }

    #[test]
    fn non_sonos_reply_is_filtered() {
        let reply = parse_reply(
            "HTTP/1.1 200 OK\r\n\
             LOCATION: http://10.0.0.9:8008/desc.xml\r\n\
             USN: uuid:some-other-renderer\r\n\
             SERVER: Chromecast UPnP/1.0\r\n\r\n",
        )
        .unwrap();
        assert!(!reply.looks_like_sonos());
    }
}
