use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::error::ApiError;
use crate::service::Service;

/// One typed UPnP action: request in, SOAP payload out, response parsed back.
///
/// Implementations are stateless; execution happens through
/// [`Speaker`](crate::Speaker), which owns the SOAP client and the device
/// address.
pub trait SpeakerOperation {
    type Request: Serialize;
    type Response: for<'de> Deserialize<'de>;

    const SERVICE: Service;
    const ACTION: &'static str;

    /// Build the inner XML arguments (no SOAP envelope).
    fn build_payload(request: &Self::Request) -> String;

    /// Parse the `{Action}Response` element into the typed response.
    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError>;
}

/// Read the text of a direct child element, `Err` when absent.
pub(crate) fn child_text(xml: &Element, name: &str) -> Result<String, ApiError> {
    xml.get_child(name)
        .and_then(|el| el.get_text())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| ApiError::Parse(format!("missing {} in {} response", name, xml.name)))
}

/// Escape text for embedding inside an XML element.
pub(crate) fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
