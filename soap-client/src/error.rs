//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during a SOAP control call
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or HTTP communication error
    #[error("network/HTTP error: {0}")]
    Network(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// SOAP fault returned by the device
    #[error("SOAP fault: UPnP error code {0}")]
    Fault(u16),
}
