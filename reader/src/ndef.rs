//! NDEF URI records
//!
//! Decodes the TLV area of a Type 2 tag into records, extracting the URI
//! from NFC Forum well-known URI records; anything else decodes to a record
//! without a URI. The decoder must never panic on arbitrary bytes; hardware
//! hands this function whatever it read off the tag. The encoder does the
//! reverse for tag writing: one URI becomes a complete TLV area with the
//! best matching prefix compression applied.

use crate::error::TransportError;
use crate::transport::TagRecord;

const TLV_NULL: u8 = 0x00;
const TLV_NDEF: u8 = 0x03;
const TLV_TERMINATOR: u8 = 0xFE;

const TNF_WELL_KNOWN: u8 = 0x01;

/// NFC Forum URI record prefix table (URI RTD, section 3.2.2)
const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Decode the records of the first NDEF message in a TLV area.
pub fn records(tlv: &[u8]) -> Result<Vec<TagRecord>, TransportError> {
    let message = ndef_message(tlv)?;
    parse_message(message)
}

/// Encode one URI as a complete TLV area: a single short-record NDEF
/// message followed by the terminator TLV.
pub fn uri_tlv(uri: &str) -> Result<Vec<u8>, TransportError> {
    let payload = encode_uri_payload(uri);
    let record_len = 3 + 1 + payload.len();
    if payload.len() > u8::MAX as usize || record_len > u8::MAX as usize {
        // Type 2 tags this size would need the long TLV/record forms; no
        // share link comes close.
        return Err(TransportError::Decode(format!(
            "URI too long to encode: {} bytes",
            uri.len()
        )));
    }

    let mut tlv = Vec::with_capacity(record_len + 3);
    tlv.push(TLV_NDEF);
    tlv.push(record_len as u8);
    tlv.push(0xD1); // MB | ME | SR, TNF well-known
    tlv.push(0x01); // type length
    tlv.push(payload.len() as u8);
    tlv.push(b'U');
    tlv.extend_from_slice(&payload);
    tlv.push(TLV_TERMINATOR);
    Ok(tlv)
}

/// URI RTD payload: prefix code byte plus the remainder. The longest
/// matching table prefix wins.
fn encode_uri_payload(uri: &str) -> Vec<u8> {
    let (code, rest) = URI_PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, prefix)| uri.starts_with(**prefix))
        .max_by_key(|(_, prefix)| prefix.len())
        .map(|(code, prefix)| (code as u8, &uri[prefix.len()..]))
        .unwrap_or((0x00, uri));

    let mut payload = Vec::with_capacity(1 + rest.len());
    payload.push(code);
    payload.extend_from_slice(rest.as_bytes());
    payload
}

/// Locate the first NDEF TLV and return its value bytes.
fn ndef_message(tlv: &[u8]) -> Result<&[u8], TransportError> {
    let mut pos = 0;
    while pos < tlv.len() {
        match tlv[pos] {
            TLV_NULL => pos += 1,
            TLV_TERMINATOR => break,
            TLV_NDEF => {
                let (len, header) = tlv_length(&tlv[pos + 1..])?;
                let start = pos + 1 + header;
                let end = start
                    .checked_add(len)
                    .filter(|&e| e <= tlv.len())
                    .ok_or_else(|| TransportError::Decode("NDEF TLV truncated".to_string()))?;
                return Ok(&tlv[start..end]);
            }
            other => {
                // Skip unknown TLV blocks (lock control etc.).
                let (len, header) = tlv_length(&tlv[pos + 1..]).map_err(|_| {
                    TransportError::Decode(format!("truncated TLV block 0x{:02x}", other))
                })?;
                pos = pos
                    .checked_add(1 + header + len)
                    .ok_or_else(|| TransportError::Decode("TLV length overflow".to_string()))?;
            }
        }
    }
    Err(TransportError::Decode("no NDEF message on tag".to_string()))
}

/// TLV length field: one byte, or 0xFF followed by a 16-bit length.
fn tlv_length(bytes: &[u8]) -> Result<(usize, usize), TransportError> {
    match bytes.first() {
        Some(0xFF) => {
            if bytes.len() < 3 {
                return Err(TransportError::Decode("truncated TLV length".to_string()));
            }
            Ok((u16::from_be_bytes([bytes[1], bytes[2]]) as usize, 3))
        }
        Some(&len) => Ok((len as usize, 1)),
        None => Err(TransportError::Decode("truncated TLV length".to_string())),
    }
}

fn parse_message(mut msg: &[u8]) -> Result<Vec<TagRecord>, TransportError> {
    let mut out = Vec::new();

    while !msg.is_empty() {
        if msg.len() < 3 {
            return Err(TransportError::Decode("truncated NDEF record header".to_string()));
        }
        let header = msg[0];
        let tnf = header & 0x07;
        let short_record = header & 0x10 != 0;
        let has_id = header & 0x08 != 0;

        let type_len = msg[1] as usize;
        let (payload_len, mut pos) = if short_record {
            (msg[2] as usize, 3)
        } else {
            if msg.len() < 6 {
                return Err(TransportError::Decode("truncated NDEF record header".to_string()));
            }
            (u32::from_be_bytes([msg[2], msg[3], msg[4], msg[5]]) as usize, 6)
        };
        let id_len = if has_id {
            let len = *msg
                .get(pos)
                .ok_or_else(|| TransportError::Decode("truncated NDEF record header".to_string()))?
                as usize;
            pos += 1;
            len
        } else {
            0
        };

        let type_end = pos + type_len;
        let payload_start = type_end + id_len;
        let payload_end = payload_start
            .checked_add(payload_len)
            .filter(|&e| e <= msg.len())
            .ok_or_else(|| TransportError::Decode("truncated NDEF record payload".to_string()))?;

        let record_type = msg
            .get(pos..type_end)
            .ok_or_else(|| TransportError::Decode("truncated NDEF record type".to_string()))?;
        let payload = &msg[payload_start..payload_end];

        let uri = if tnf == TNF_WELL_KNOWN && record_type == b"U" {
            decode_uri_payload(payload)
        } else {
            None
        };
        out.push(TagRecord { uri });

        let message_end = header & 0x40 != 0;
        if message_end {
            break;
        }
        msg = &msg[payload_end..];
    }

    Ok(out)
}

fn decode_uri_payload(payload: &[u8]) -> Option<String> {
    let (&code, rest) = payload.split_first()?;
    // Reserved prefix codes are treated as no prefix, per the RTD.
    let prefix = URI_PREFIXES.get(code as usize).copied().unwrap_or("");
    let rest = std::str::from_utf8(rest).ok()?;
    Some(format!("{}{}", prefix, rest))
}
