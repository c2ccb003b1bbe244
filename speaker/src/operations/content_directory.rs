//! ContentDirectory operations
//!
//! Queue listing browses the queue container `Q:0`. The interesting part is
//! the response: the entries arrive as a DIDL-Lite document escaped inside
//! the `Result` element, so parsing happens in two stages.

use serde::{Deserialize, Serialize};
use xmltree::Element;

use crate::operation::{child_text, SpeakerOperation};
use crate::{ApiError, Service};

/// One entry of the playback queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub title: String,
}

/// Browse of the queue container
pub struct BrowseQueueOperation;

#[derive(Serialize)]
pub struct BrowseQueueRequest {
    pub starting_index: u32,
    pub requested_count: u32,
}

#[derive(Deserialize)]
pub struct BrowseQueueResponse {
    pub items: Vec<QueueItem>,
    pub total_matches: u32,
}

impl SpeakerOperation for BrowseQueueOperation {
    type Request = BrowseQueueRequest;
    type Response = BrowseQueueResponse;

    const SERVICE: Service = Service::ContentDirectory;
    const ACTION: &'static str = "Browse";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<ObjectID>Q:0</ObjectID>\
             <BrowseFlag>BrowseDirectChildren</BrowseFlag>\
             <Filter>dc:title,res</Filter>\
             <StartingIndex>{}</StartingIndex>\
             <RequestedCount>{}</RequestedCount>\
             <SortCriteria></SortCriteria>",
            request.starting_index, request.requested_count
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        let didl_text = child_text(xml, "Result")?;
        let total_matches = child_text(xml, "TotalMatches")?
            .parse()
            .map_err(|_| ApiError::Parse("TotalMatches is not a number".to_string()))?;

        Ok(BrowseQueueResponse {
            items: parse_didl_titles(&didl_text)?,
            total_matches,
        })
    }
}

/// Extract the `dc:title` of every item/container in a DIDL-Lite document.
fn parse_didl_titles(didl: &str) -> Result<Vec<QueueItem>, ApiError> {
    if didl.trim().is_empty() {
        return Ok(Vec::new());
    }
    let root = Element::parse(didl.as_bytes())
        .map_err(|e| ApiError::Parse(format!("bad DIDL-Lite payload: {}", e)))?;

    let items = root
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .filter(|el| el.name == "item" || el.name == "container")
        .map(|el| QueueItem {
            title: el
                .get_child("title")
                .and_then(|t| t.get_text())
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browse_payload_targets_queue_container() {
        let payload = BrowseQueueOperation::build_payload(&BrowseQueueRequest {
            starting_index: 0,
            requested_count: 100,
        });
        assert!(payload.starts_with("<ObjectID>Q:0</ObjectID>"));
        assert!(payload.contains("<BrowseFlag>BrowseDirectChildren</BrowseFlag>"));
        assert!(payload.contains("<RequestedCount>100</RequestedCount>"));
    }

    #[test]
    fn parses_titles_from_escaped_didl() {
        // The device escapes the DIDL document inside <Result>; xmltree
        // unescapes it when reading the element text.
        let xml = Element::parse(
            br#"<BrowseResponse>
                <Result>&lt;DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/"&gt;&lt;item id="Q:0/1"&gt;&lt;dc:title&gt;Alpha&lt;/dc:title&gt;&lt;/item&gt;&lt;item id="Q:0/2"&gt;&lt;dc:title&gt;Beta&lt;/dc:title&gt;&lt;/item&gt;&lt;/DIDL-Lite&gt;</Result>
                <NumberReturned>2</NumberReturned>
                <TotalMatches>2</TotalMatches>
                <UpdateID>7</UpdateID>
            </BrowseResponse>"# as &[u8],
        )
        .unwrap();

        let response = BrowseQueueOperation::parse_response(&xml).unwrap();
        assert_eq!(response.total_matches, 2);
        assert_eq!(
            response.items,
            vec![
                QueueItem { title: "Alpha".to_string() },
                QueueItem { title: "Beta".to_string() },
            ]
        );
    }

    #[test]
    fn empty_queue_yields_no_items() {
        let empty =
            r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"></DIDL-Lite>"#;
        assert!(parse_didl_titles(empty).unwrap().is_empty());
        assert!(parse_didl_titles("").unwrap().is_empty());
    }

    #[test]
    fn didl_garbage_is_a_parse_error() {
        assert!(matches!(
            parse_didl_titles("<DIDL-Lite><item>"),
            Err(ApiError::Parse(_))
        ));
    }
}
