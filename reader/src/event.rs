use std::time::SystemTime;

/// One debounced tag presentation
///
/// Produced at most once per continuous presentation of a tag: the sensing
/// loop blocks on the handler and then waits out a stabilization delay
/// before polling again, so a tag left on the reader cannot re-trigger
/// within that window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEvent {
    /// Hex-encoded tag UID, when the transport reports one
    pub uid: Option<String>,
    /// URI decoded from the tag payload
    pub payload_uri: Option<String>,
    pub detected_at: SystemTime,
}
