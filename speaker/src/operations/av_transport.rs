//! AVTransport operations
//!
//! Playback transport control plus the two queue actions the tag dispatch
//! chain needs (AddURIToQueue, RemoveAllTracksFromQueue). "Play from queue
//! index" is Seek(TRACK_NR) followed by Play, issued by the device handle.

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::operation::{child_text, xml_escape, SpeakerOperation};
use crate::{ApiError, Service};

/// Play operation
pub struct PlayOperation;

#[derive(Serialize)]
pub struct PlayRequest {
    pub instance_id: u32,
    pub speed: String,
}

#[derive(Deserialize)]
pub struct PlayResponse;

impl SpeakerOperation for PlayOperation {
    type Request = PlayRequest;
    type Response = PlayResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Play";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID><Speed>{}</Speed>",
            request.instance_id, request.speed
        )
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(PlayResponse)
    }
}

/// Pause operation
pub struct PauseOperation;

#[derive(Serialize)]
pub struct PauseRequest {
    pub instance_id: u32,
}

#[derive(Deserialize)]
pub struct PauseResponse;

impl SpeakerOperation for PauseOperation {
    type Request = PauseRequest;
    type Response = PauseResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Pause";

    fn build_payload(request: &Self::Request) -> String {
        format!("<InstanceID>{}</InstanceID>", request.instance_id)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(PauseResponse)
    }
}

/// Next operation (skip to the next queue entry)
pub struct NextOperation;

#[derive(Serialize)]
pub struct NextRequest {
    pub instance_id: u32,
}

#[derive(Deserialize)]
pub struct NextResponse;

impl SpeakerOperation for NextOperation {
    type Request = NextRequest;
    type Response = NextResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Next";

    fn build_payload(request: &Self::Request) -> String {
        format!("<InstanceID>{}</InstanceID>", request.instance_id)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(NextResponse)
    }
}

/// Stop operation
pub struct StopOperation;

#[derive(Serialize)]
pub struct StopRequest {
    pub instance_id: u32,
}

#[derive(Deserialize)]
pub struct StopResponse;

impl SpeakerOperation for StopOperation {
    type Request = StopRequest;
    type Response = StopResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Stop";

    fn build_payload(request: &Self::Request) -> String {
        format!("<InstanceID>{}</InstanceID>", request.instance_id)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(StopResponse)
    }
}

/// Seek operation, used in TRACK_NR mode to select a queue position
pub struct SeekOperation;

#[derive(Serialize)]
pub struct SeekRequest {
    pub instance_id: u32,
    pub unit: String,
    pub target: String,
}

#[derive(Deserialize)]
pub struct SeekResponse;

impl SpeakerOperation for SeekOperation {
    type Request = SeekRequest;
    type Response = SeekResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Seek";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID><Unit>{}</Unit><Target>{}</Target>",
            request.instance_id, request.unit, request.target
        )
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(SeekResponse)
    }
}

/// AddURIToQueue operation
pub struct AddUriToQueueOperation;

#[derive(Serialize)]
pub struct AddUriToQueueRequest {
    pub instance_id: u32,
    pub enqueued_uri: String,
    pub enqueued_uri_metadata: String,
    pub desired_first_track: u32,
    pub enqueue_as_next: bool,
}

#[derive(Deserialize)]
pub struct AddUriToQueueResponse {
    /// 1-based queue position the entry landed at
    pub first_track_number: u32,
    pub num_tracks_added: u32,
    pub new_queue_length: u32,
}

impl SpeakerOperation for AddUriToQueueOperation {
    type Request = AddUriToQueueRequest;
    type Response = AddUriToQueueResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "AddURIToQueue";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID>\
             <EnqueuedURI>{}</EnqueuedURI>\
             <EnqueuedURIMetaData>{}</EnqueuedURIMetaData>\
             <DesiredFirstTrackNumberEnqueued>{}</DesiredFirstTrackNumberEnqueued>\
             <EnqueueAsNext>{}</EnqueueAsNext>",
            request.instance_id,
            xml_escape(&request.enqueued_uri),
            xml_escape(&request.enqueued_uri_metadata),
            request.desired_first_track,
            request.enqueue_as_next as u8,
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        let parse_u32 = |name: &str| -> Result<u32, ApiError> {
            child_text(xml, name)?
                .parse()
                .map_err(|_| ApiError::Parse(format!("{} is not a number", name)))
        };
        Ok(AddUriToQueueResponse {
            first_track_number: parse_u32("FirstTrackNumberEnqueued")?,
            num_tracks_added: parse_u32("NumTracksAdded")?,
            new_queue_length: parse_u32("NewQueueLength")?,
        })
    }
}

/// RemoveAllTracksFromQueue operation
pub struct RemoveAllTracksOperation;

#[derive(Serialize)]
pub struct RemoveAllTracksRequest {
    pub instance_id: u32,
}

#[derive(Deserialize)]
pub struct RemoveAllTracksResponse;

impl SpeakerOperation for RemoveAllTracksOperation {
    type Request = RemoveAllTracksRequest;
    type Response = RemoveAllTracksResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "RemoveAllTracksFromQueue";

    fn build_payload(request: &Self::Request) -> String {
        format!("<InstanceID>{}</InstanceID>", request.instance_id)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(RemoveAllTracksResponse)
    }
}
