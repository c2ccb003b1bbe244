//! Sonos device discovery
//!
//! SSDP-based discovery of Sonos players on the local network. The tagplay
//! binary only ever needs one speaker, so besides the collect-everything
//! [`discover`] there is [`find_any`], which returns as soon as the first
//! player answers instead of waiting out the whole search window.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! if let Ok(Some(device)) = discovery::find_any(Duration::from_secs(3)) {
//!     println!("found {} at {}", device.name, device.authority());
//! }
//! ```

mod device;
mod error;
mod ssdp;

pub use error::{DiscoveryError, Result};

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

/// A Sonos player found on the local network
#[derive(Debug, Clone)]
pub struct Device {
    /// Unique device identifier (UDN), e.g. `uuid:RINCON_...`
    pub id: String,
    /// Friendly name reported by the device
    pub name: String,
    /// Room the device is assigned to
    pub room_name: String,
    /// IP address
    pub ip_address: String,
    /// Control port, normally 1400
    pub port: u16,
    /// Model name, e.g. "Sonos One"
    pub model_name: String,
}

impl Device {
    /// `host:port` authority for control calls
    pub fn authority(&self) -> String {
        format!("{}:{}", self.ip_address, self.port)
    }
}

/// Discover every Sonos player that answers within `timeout`.
pub fn discover(timeout: Duration) -> Result<Vec<Device>> {
    let mut found = Vec::new();
    scan(timeout, |device| {
        found.push(device);
        false
    })?;
    Ok(found)
}

/// Return the first Sonos player to answer, or `None` when the search
/// window elapses without one.
pub fn find_any(timeout: Duration) -> Result<Option<Device>> {
    let mut found = None;
    scan(timeout, |device| {
        found = Some(device);
        true
    })?;
    Ok(found)
}

/// Run one SSDP search, verifying each reply's device description. The
/// callback returns `true` to stop the scan early.
fn scan(timeout: Duration, mut on_device: impl FnMut(Device) -> bool) -> Result<()> {
    let search = ssdp::SsdpSearch::start(timeout)?;
    let http = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DiscoveryError::Network(format!("failed to build HTTP client: {}", e)))?;

    let mut seen = HashSet::new();
    while let Some(reply) = search.recv()? {
        if !seen.insert(reply.location.clone()) {
            continue;
        }
        if !reply.looks_like_sonos() {
            debug!(location = %reply.location, "skipping non-Sonos SSDP reply");
            continue;
        }
        match device::fetch(&http, &reply.location) {
            Ok(Some(device)) => {
                debug!(name = %device.name, ip = %device.ip_address, "verified Sonos device");
                if on_device(device) {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => debug!(location = %reply.location, error = %e, "description fetch failed"),
        }
    }
    Ok(())
}
