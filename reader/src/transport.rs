//! The tag transport seam
//!
//! The sensing loop is written against this trait so the orchestration core
//! never depends on a particular reader chip. The `acr122` feature provides
//! a real backend; tests script mock transports.

use std::time::Duration;

use crate::error::TransportError;

/// Parameters for one sensing burst
#[derive(Debug, Clone)]
pub struct PollSpec {
    /// Tag technology to poll for
    pub technology: TagTechnology,
    /// Number of poll iterations per burst
    pub iterations: u32,
    /// Pause between iterations
    pub period: Duration,
}

impl Default for PollSpec {
    fn default() -> Self {
        Self {
            technology: TagTechnology::Iso14443a,
            iterations: 5,
            period: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTechnology {
    /// NFC Type 2 tags (NTAG21x and friends)
    Iso14443a,
}

/// A tag currently present in the reader's field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTarget {
    /// Hex-encoded tag UID, when the transport reports one
    pub uid: Option<String>,
}

/// One decoded record from a tag payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// URI carried by the record, if it is a URI record
    pub uri: Option<String>,
}

pub trait TagTransport {
    /// Open a session against the (freshly reset) device. Failure counts
    /// as a transport fault.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Run one bounded sensing burst. `Ok(None)` means no tag showed up.
    fn sense(&mut self, poll: &PollSpec) -> Result<Option<TagTarget>, TransportError>;

    /// Read and decode the payload of a present tag.
    fn read(&mut self, target: &TagTarget) -> Result<Vec<TagRecord>, TransportError>;

    /// Replace the payload of a present tag with a single URI record.
    fn write(&mut self, target: &TagTarget, uri: &str) -> Result<(), TransportError>;
}
