//! The shared device handle
//!
//! One `Speaker` is the single logical connection to the playback device.
//! It owns the SOAP client and the device address; callers serialize access
//! through a mutex at the application layer, so every method takes
//! `&mut self`.

use std::thread;
use std::time::Duration;

use soap_client::SoapClient;
use tracing::{info, warn};

use crate::control::PlaybackControl;
use crate::error::{ApiError, Result};
use crate::operation::SpeakerOperation;
use crate::operations::av_transport::{
    AddUriToQueueOperation, AddUriToQueueRequest, NextOperation, NextRequest, PauseOperation,
    PauseRequest, PlayOperation, PlayRequest, RemoveAllTracksOperation, RemoveAllTracksRequest,
    SeekOperation, SeekRequest, StopOperation, StopRequest,
};
use crate::operations::content_directory::{BrowseQueueOperation, BrowseQueueRequest, QueueItem};
use crate::operations::rendering_control::{
    GetVolumeOperation, GetVolumeRequest, SetVolumeOperation, SetVolumeRequest,
};
use crate::sharelink::ShareLink;

const INSTANCE_ID: u32 = 0;
const MASTER: &str = "Master";
const QUEUE_PAGE_SIZE: u32 = 100;

/// Connectivity of the device session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Faulted,
}

/// The live handle to the playback device
#[derive(Debug)]
pub struct Speaker {
    authority: String,
    client: SoapClient,
    state: ConnectionState,
}

impl Speaker {
    /// Create a handle for a known `host:port` address. The session stays
    /// `Disconnected` until the first call round-trips.
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            client: SoapClient::new(),
            state: ConnectionState::Disconnected,
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn execute<Op: SpeakerOperation>(&mut self, request: &Op::Request) -> Result<Op::Response> {
        let service = Op::SERVICE.info();
        let payload = Op::build_payload(request);
        let result = self.client.call(
            &self.authority,
            service.endpoint,
            service.service_uri,
            Op::ACTION,
            &payload,
        );
        match result {
            Ok(xml) => {
                self.state = ConnectionState::Connected;
                Op::parse_response(&xml)
            }
            Err(e) => {
                let e = ApiError::from(e);
                // A fault or garbled body still proves the device answered;
                // only network failures mark the session faulted.
                self.state = if matches!(e, ApiError::Network(_)) {
                    ConnectionState::Faulted
                } else {
                    ConnectionState::Connected
                };
                Err(e)
            }
        }
    }
}

impl PlaybackControl for Speaker {
    fn play(&mut self) -> Result<()> {
        self.execute::<PlayOperation>(&PlayRequest {
            instance_id: INSTANCE_ID,
            speed: "1".to_string(),
        })?;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.execute::<PauseOperation>(&PauseRequest { instance_id: INSTANCE_ID })?;
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        self.execute::<NextOperation>(&NextRequest { instance_id: INSTANCE_ID })?;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.execute::<StopOperation>(&StopRequest { instance_id: INSTANCE_ID })?;
        Ok(())
    }

    fn set_volume(&mut self, level: u8) -> Result<()> {
        if level > 100 {
            return Err(ApiError::InvalidParameter(format!(
                "volume {} out of range 0..=100",
                level
            )));
        }
        self.execute::<SetVolumeOperation>(&SetVolumeRequest {
            instance_id: INSTANCE_ID,
            channel: MASTER.to_string(),
            desired_volume: level,
        })?;
        Ok(())
    }

    fn get_volume(&mut self) -> Result<u8> {
        let response = self.execute::<GetVolumeOperation>(&GetVolumeRequest {
            instance_id: INSTANCE_ID,
            channel: MASTER.to_string(),
        })?;
        Ok(response.current_volume)
    }

    fn clear_queue(&mut self) -> Result<()> {
        self.execute::<RemoveAllTracksOperation>(&RemoveAllTracksRequest {
            instance_id: INSTANCE_ID,
        })?;
        Ok(())
    }

    fn enqueue_at(&mut self, link: &ShareLink, position: u32) -> Result<u32> {
        let response = self.execute::<AddUriToQueueOperation>(&AddUriToQueueRequest {
            instance_id: INSTANCE_ID,
            enqueued_uri: link.enqueue_uri(),
            enqueued_uri_metadata: link.metadata(),
            desired_first_track: position,
            enqueue_as_next: true,
        })?;
        Ok(response.first_track_number)
    }

    fn play_from_queue(&mut self, index: u32) -> Result<()> {
        // TRACK_NR is 1-based on the wire.
        self.execute::<SeekOperation>(&SeekRequest {
            instance_id: INSTANCE_ID,
            unit: "TRACK_NR".to_string(),
            target: (index + 1).to_string(),
        })?;
        self.play()
    }

    fn list_queue(&mut self) -> Result<Vec<QueueItem>> {
        let response = self.execute::<BrowseQueueOperation>(&BrowseQueueRequest {
            starting_index: 0,
            requested_count: QUEUE_PAGE_SIZE,
        })?;
        Ok(response.items)
    }
}

/// How to locate the playback device at startup
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Number of discovery rounds before giving up on discovery
    pub attempts: u32,
    /// Delay between discovery rounds; the device may not be on the
    /// network yet when the process starts
    pub retry_delay: Duration,
    /// SSDP/HTTP timeout per round
    pub timeout: Duration,
    /// Static `host:port` to fall back to when discovery finds nothing
    pub fallback: Option<String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(3),
            fallback: None,
        }
    }
}

/// Locate the playback device and build the shared handle: discovery first,
/// retried with a delay, then the static fallback address.
pub fn connect(options: &ConnectOptions) -> Result<Speaker> {
    for attempt in 1..=options.attempts {
        match discovery::find_any(options.timeout) {
            Ok(Some(device)) => {
                info!(name = %device.name, room = %device.room_name, authority = %device.authority(),
                    "discovered playback device");
                return Ok(Speaker::new(device.authority()));
            }
            Ok(None) => {
                info!(attempt, attempts = options.attempts, "no device answered discovery");
            }
            Err(e) => {
                warn!(attempt, error = %e, "discovery round failed");
            }
        }
        if attempt < options.attempts {
            thread::sleep(options.retry_delay);
        }
    }

    if let Some(fallback) = &options.fallback {
        info!(authority = %fallback, "falling back to configured device address");
        return Ok(Speaker::new(fallback.clone()));
    }

    Err(ApiError::NotFound(
        "discovery exhausted and no fallback address configured".to_string(),
    ))
}
