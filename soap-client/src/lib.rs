//! Private SOAP client for UPnP device communication
//!
//! A minimal blocking SOAP client for issuing control actions against UPnP
//! renderers. The caller supplies the device authority (`host:port`) so the
//! same client works against a real speaker on port 1400 or a local test
//! server.

mod error;

pub use error::SoapError;

use std::time::Duration;
use xmltree::Element;

/// A minimal SOAP client for UPnP control endpoints
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout_read(Duration::from_secs(10))
                .build(),
        }
    }

    /// Send a SOAP action and return the parsed `{action}Response` element.
    ///
    /// # Arguments
    /// * `authority` - device address as `host:port`
    /// * `endpoint` - control endpoint path, e.g. `MediaRenderer/AVTransport/Control`
    /// * `service_uri` - UPnP service URN
    /// * `action` - SOAP action name
    /// * `payload` - inner XML arguments (no envelope)
    pub fn call(
        &self,
        authority: &str,
        endpoint: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = build_envelope(service_uri, action, payload);
        let url = format!("http://{}/{}", authority, endpoint);
        let soap_action = format!("\"{}#{}\"", service_uri, action);

        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body);

        // ureq treats HTTP 500 as an error, but UPnP faults arrive as 500
        // with a SOAP body we still need to parse.
        let xml_text = match response {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            Err(ureq::Error::Status(_, resp)) => resp
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            Err(e) => return Err(SoapError::Network(e.to_string())),
        };

        let xml =
            Element::parse(xml_text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_response(&xml, action)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn build_envelope(service_uri: &str, action: &str, payload: &str) -> String {
    format!(
        concat!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<s:Body><u:{action} xmlns:u="{service}">{payload}</u:{action}></s:Body>"#,
            r#"</s:Envelope>"#
        ),
        action = action,
        service = service_uri,
        payload = payload,
    )
}

/// Unwrap the `{action}Response` element from a SOAP envelope, surfacing
/// UPnP faults as `SoapError::Fault`.
fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        let code = fault
            .get_child("detail")
            .and_then(|d| d.get_child("UPnPError").or_else(|| d.get_child("UpnPError")))
            .and_then(|e| e.get_child("errorCode"))
            .and_then(|c| c.get_text())
            .and_then(|t| t.trim().parse::<u16>().ok())
            .unwrap_or(500);
        return Err(SoapError::Fault(code));
    }

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("missing {} element", response_name)))
}
