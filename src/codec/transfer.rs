//! Round-trip state transfer between a remote agent and an aggregator.
//!
//! The payload is JSON, strictly ASCII: any non-ASCII character in strings is
//! written as a `\u` escape so the bytes survive any transport.

use serde_json::Value;

use super::wire::WireValue;
use crate::error::CodecError;
use crate::models::MonitorData;

pub fn encode_state(data: &MonitorData) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_string(data)?;
    Ok(escape_non_ascii(&json).into_bytes())
}

pub fn decode_state(bytes: &[u8]) -> Result<MonitorData, CodecError> {
    let text = ascii_text(bytes)?;
    Ok(serde_json::from_str(text)?)
}

/// Encode every monitor an agent reports in one payload.
pub fn encode_states(states: &[MonitorData]) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_string(states)?;
    Ok(escape_non_ascii(&json).into_bytes())
}

pub fn decode_states(bytes: &[u8]) -> Result<Vec<MonitorData>, CodecError> {
    let text = ascii_text(bytes)?;
    Ok(serde_json::from_str(text)?)
}

/// Decode an arbitrary payload without assuming its shape.
pub fn decode_value(bytes: &[u8]) -> Result<WireValue, CodecError> {
    let text = ascii_text(bytes)?;
    let value: Value = serde_json::from_str(text)?;
    Ok(WireValue::decode(value))
}

fn ascii_text(bytes: &[u8]) -> Result<&str, CodecError> {
    if !bytes.is_ascii() {
        return Err(CodecError::NotAscii);
    }
    std::str::from_utf8(bytes).map_err(|_| CodecError::NotAscii)
}

/// Rewrite non-ASCII characters as JSON `\u` escapes.
///
/// Only valid on serialized JSON, where such characters can only occur
/// inside string literals.
fn escape_non_ascii(json: &str) -> String {
    if json.is_ascii() {
        return json.to_string();
    }
    let mut out = String::with_capacity(json.len() + 16);
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_non_ascii() {
        assert_eq!(escape_non_ascii(r#"{"a":"b"}"#), r#"{"a":"b"}"#);
        assert_eq!(escape_non_ascii(r#""café""#), r#""caf\u00e9""#);
        // astral plane characters become surrogate pairs
        assert_eq!(escape_non_ascii(r#""🙂""#), r#""\ud83d\ude42""#);
    }

    #[test]
    fn test_escaped_output_parses_back() {
        let original = serde_json::json!({"info": "Überlastung 🙂"});
        let escaped = escape_non_ascii(&original.to_string());
        assert!(escaped.is_ascii());
        let parsed: Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_non_ascii_payload_rejected() {
        let err = decode_value("{\"a\":\"é\"}".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::NotAscii));
    }
}
