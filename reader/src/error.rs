use thiserror::Error;

/// Errors from the USB-level reset of the tag transport device
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The transport device is not attached at all. Fatal to the session.
    #[error("tag transport device not found")]
    NotFound,

    /// The device exists but could not be claimed for exclusive use.
    /// Transient; the caller may retry after a backoff.
    #[error("failed to claim tag transport device: {0}")]
    ClaimFailed(String),
}

/// Errors from sensing or reading tags
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// I/O-level failure. Recoverable by resetting the reader, up to the
    /// fault budget.
    #[error("transport I/O error: {0}")]
    Io(String),

    /// A specific tag could not be decoded. Non-fatal: the tag is treated
    /// as carrying no usable payload.
    #[error("tag decode error: {0}")]
    Decode(String),
}

/// Failure of a one-shot tag write
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No tag entered the field within the configured wait
    #[error("no tag presented within {bursts} poll bursts")]
    NoTag { bursts: u32 },
}

/// Terminal failure of the sensing loop, reported through [`SensorExit`]
///
/// [`SensorExit`]: crate::SensorExit
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("tag transport device not found")]
    DeviceNotFound,

    #[error("fault budget exhausted after {attempts} attempts: {last_fault}")]
    FaultBudget { attempts: u32, last_fault: String },
}
