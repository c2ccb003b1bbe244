//! RenderingControl operations (Master channel volume)

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::operation::{child_text, SpeakerOperation};
use crate::{ApiError, Service};

/// SetVolume operation
pub struct SetVolumeOperation;

#[derive(Serialize)]
pub struct SetVolumeRequest {
    pub instance_id: u32,
    pub channel: String,
    pub desired_volume: u8,
}

#[derive(Deserialize)]
pub struct SetVolumeResponse;

impl SpeakerOperation for SetVolumeOperation {
    type Request = SetVolumeRequest;
    type Response = SetVolumeResponse;

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "SetVolume";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID><Channel>{}</Channel><DesiredVolume>{}</DesiredVolume>",
            request.instance_id, request.channel, request.desired_volume
        )
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(SetVolumeResponse)
    }
}

/// GetVolume operation
pub struct GetVolumeOperation;

#[derive(Serialize)]
pub struct GetVolumeRequest {
    pub instance_id: u32,
    pub channel: String,
}

#[derive(Deserialize)]
pub struct GetVolumeResponse {
    pub current_volume: u8,
}

impl SpeakerOperation for GetVolumeOperation {
    type Request = GetVolumeRequest;
    type Response = GetVolumeResponse;

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "GetVolume";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID><Channel>{}</Channel>",
            request.instance_id, request.channel
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        let current_volume = child_text(xml, "CurrentVolume")?
            .parse()
            .map_err(|_| ApiError::Parse("CurrentVolume is not a number".to_string()))?;
        Ok(GetVolumeResponse { current_volume })
    }
}
