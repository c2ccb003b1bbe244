//! Error types for device discovery

use thiserror::Error;

/// Errors raised while searching the local network for playback devices
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket or HTTP failure
    #[error("network error: {0}")]
    Network(String),

    /// Malformed SSDP reply or device description
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
