//! UPnP device description fetch and parse

use serde::Deserialize;

use crate::error::{DiscoveryError, Result};
use crate::Device;

#[derive(Debug, Deserialize)]
struct DescriptionRoot {
    device: Description,
}

/// The subset of the device description this crate needs
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Description {
    device_type: String,
    friendly_name: String,
    manufacturer: String,
    model_name: String,
    room_name: Option<String>,
    #[serde(rename = "UDN")]
    udn: String,
}

impl Description {
    fn is_sonos(&self) -> bool {
        self.manufacturer.to_ascii_lowercase().contains("sonos")
            || self.device_type.contains("ZonePlayer")
    }
}

/// Fetch a description document and turn it into a verified [`Device`].
/// Returns `Ok(None)` when the description belongs to something other than
/// a Sonos player.
pub(crate) fn fetch(client: &reqwest::blocking::Client, location: &str) -> Result<Option<Device>> {
    let xml = client
        .get(location)
        .send()
        .and_then(|resp| resp.text())
        .map_err(|e| DiscoveryError::Network(format!("failed to fetch {}: {}", location, e)))?;

    let device = parse(&xml, location)?;
    Ok(device)
}

pub(crate) fn parse(xml: &str, location: &str) -> Result<Option<Device>> {
    let root: DescriptionRoot = quick_xml::de::from_str(xml)
        .map_err(|e| DiscoveryError::Parse(format!("bad device description: {}", e)))?;
    let desc = root.device;

    if !desc.is_sonos() {
        return Ok(None);
    }

    let (ip_address, port) = split_authority(location).ok_or_else(|| {
        DiscoveryError::Parse(format!("cannot extract address from location {}", location))
    })?;

    Ok(Some(Device {
        id: desc.udn,
        name: desc.friendly_name,
        room_name: desc.room_name.unwrap_or_else(|| "Unknown".to_string()),
        ip_address,
        port,
        model_name: desc.model_name,
    }))
}

/// Split `http://host:port/path` into `(host, port)`, defaulting to 1400.
fn split_authority(url: &str) -> Option<(String, u16)> {
    let rest = url.split("//").nth(1)?;
    let authority = rest.split('/').next()?;
    match authority.split_once(':') {
        Some((host, port)) => Some((host.to_string(), port.parse().ok()?)),
        None => Some((authority.to_string(), 1400)),
    }
}
