use soap_client::SoapError;
use thiserror::Error;

/// High-level errors for speaker control operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// The device could not be reached over the network
    #[error("network error: {0}")]
    Network(String),

    /// The device answered but the response could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// The device rejected the action with a UPnP fault
    #[error("device rejected action: UPnP error code {0}")]
    Fault(u16),

    /// A parameter was invalid before any device call was made
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No playback device could be located on the network
    #[error("no playback device found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => ApiError::Network(msg),
            SoapError::Parse(msg) => ApiError::Parse(msg),
            SoapError::Fault(code) => ApiError::Fault(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soap_errors_map_to_api_errors() {
        assert!(matches!(
            ApiError::from(SoapError::Network("timed out".into())),
            ApiError::Network(_)
        ));
        assert!(matches!(ApiError::from(SoapError::Fault(701)), ApiError::Fault(701)));
    }
}
