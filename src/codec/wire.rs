//! Tagged wire forms for values plain JSON cannot carry.
//!
//! Timestamps and monitor states are wrapped in single-key objects:
//!
//! ```json
//! {"__simplemonitor_datetime": "2024-01-01 12:00:00.000000"}
//! {"__simplemonitor_monitorstate": "FAILED"}
//! ```
//!
//! Typed fields use the `serde(with = ...)` modules below. [`WireValue`]
//! decodes arbitrary payloads, recognising the tags wherever they appear.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::CodecError;
use crate::models::state::MonitorState;

pub const DATETIME_TAG: &str = "__simplemonitor_datetime";
pub const MONITORSTATE_TAG: &str = "__simplemonitor_monitorstate";

/// UTC, microseconds, no timezone suffix
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// The two tagged shapes, exactly as they appear on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaggedValue {
    #[serde(rename = "__simplemonitor_datetime")]
    Datetime(String),
    #[serde(rename = "__simplemonitor_monitorstate")]
    MonitorState(String),
}

impl TaggedValue {
    pub fn timestamp(ts: &DateTime<Utc>) -> Self {
        TaggedValue::Datetime(format_timestamp(ts))
    }

    pub fn state(state: MonitorState) -> Self {
        TaggedValue::MonitorState(state.name().to_string())
    }

    pub fn into_timestamp(self) -> Result<DateTime<Utc>, CodecError> {
        match self {
            TaggedValue::Datetime(s) => parse_timestamp(&s),
            TaggedValue::MonitorState(s) => Err(CodecError::InvalidTimestamp(s)),
        }
    }

    pub fn into_state(self) -> Result<MonitorState, CodecError> {
        match self {
            TaggedValue::MonitorState(s) => s.parse(),
            TaggedValue::Datetime(s) => Err(CodecError::UnknownState(s)),
        }
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CodecError> {
    if !timestamp_pattern().is_match(s) {
        return Err(CodecError::InvalidTimestamp(s.to_string()));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| CodecError::InvalidTimestamp(s.to_string()))
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{6}$").expect("Invalid regex pattern")
    })
}

pub mod tagged_timestamp {
    use super::TaggedValue;
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedValue::timestamp(ts).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        TaggedValue::deserialize(deserializer)?
            .into_timestamp()
            .map_err(D::Error::custom)
    }
}

pub mod tagged_timestamp_opt {
    use super::TaggedValue;
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        ts.as_ref().map(TaggedValue::timestamp).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<TaggedValue>::deserialize(deserializer)?
            .map(TaggedValue::into_timestamp)
            .transpose()
            .map_err(D::Error::custom)
    }
}

pub mod tagged_state {
    use super::TaggedValue;
    use crate::models::state::MonitorState;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(state: &MonitorState, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedValue::state(*state).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MonitorState, D::Error> {
        TaggedValue::deserialize(deserializer)?
            .into_state()
            .map_err(D::Error::custom)
    }
}

/// A decoded wire value with tagged forms recognised.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Timestamp(DateTime<Utc>),
    State(MonitorState),
    Map(BTreeMap<String, WireValue>),
    List(Vec<WireValue>),
    /// Strings, numbers, booleans and null
    Plain(Value),
}

impl WireValue {
    /// Decode a JSON value, turning well-formed tagged objects into their
    /// native form. A tag with a malformed payload stays a plain mapping.
    pub fn decode(value: Value) -> Self {
        match value {
            Value::Object(map) => match recognise_tag(&map) {
                Some(decoded) => decoded,
                None => WireValue::Map(
                    map.into_iter()
                        .map(|(k, v)| (k, WireValue::decode(v)))
                        .collect(),
                ),
            },
            Value::Array(items) => WireValue::List(items.into_iter().map(WireValue::decode).collect()),
            other => WireValue::Plain(other),
        }
    }

    pub fn encode(&self) -> Value {
        match self {
            WireValue::Timestamp(ts) => tagged_object(DATETIME_TAG, format_timestamp(ts)),
            WireValue::State(state) => tagged_object(MONITORSTATE_TAG, state.name().to_string()),
            WireValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.encode()))
                    .collect(),
            ),
            WireValue::List(items) => Value::Array(items.iter().map(WireValue::encode).collect()),
            WireValue::Plain(value) => value.clone(),
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            WireValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<MonitorState> {
        match self {
            WireValue::State(state) => Some(*state),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&WireValue> {
        match self {
            WireValue::Map(map) => map.get(key),
            _ => None,
        }
    }
}

fn recognise_tag(map: &Map<String, Value>) -> Option<WireValue> {
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    let text = value.as_str()?;
    match key.as_str() {
        DATETIME_TAG => parse_timestamp(text).ok().map(WireValue::Timestamp),
        MONITORSTATE_TAG => text.parse().ok().map(WireValue::State),
        _ => None,
    }
}

fn tagged_object(tag: &str, text: String) -> Value {
    let mut map = Map::new();
    map.insert(tag.to_string(), Value::String(text));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap() + chrono::Duration::microseconds(123_456)
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(&sample_ts()), "2024-03-05 07:08:09.123456");
        let whole = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(format_timestamp(&whole), "2024-03-05 07:08:09.000000");
    }

    #[test]
    fn test_parse_timestamp_rejects_other_shapes() {
        assert_eq!(parse_timestamp("2024-03-05 07:08:09.123456").unwrap(), sample_ts());
        assert!(parse_timestamp("2024-03-05T07:08:09.123456").is_err());
        assert!(parse_timestamp("2024-03-05 07:08:09").is_err());
        assert!(parse_timestamp("2024-03-05 07:08:09.123456Z").is_err());
        assert!(parse_timestamp("2024-13-05 07:08:09.123456").is_err());
    }

    #[test]
    fn test_tagged_value_shapes() {
        let ts = serde_json::to_value(TaggedValue::timestamp(&sample_ts())).unwrap();
        assert_eq!(ts, json!({"__simplemonitor_datetime": "2024-03-05 07:08:09.123456"}));

        let state = serde_json::to_value(TaggedValue::state(MonitorState::Failed)).unwrap();
        assert_eq!(state, json!({"__simplemonitor_monitorstate": "FAILED"}));
    }

    #[test]
    fn test_decode_recognises_tags_recursively() {
        let payload = json!({
            "when": {"__simplemonitor_datetime": "2024-03-05 07:08:09.123456"},
            "state": {"__simplemonitor_monitorstate": "OK"},
            "history": [{"__simplemonitor_monitorstate": "SKIPPED"}, 3],
            "name": "db"
        });

        let decoded = WireValue::decode(payload.clone());
        assert_eq!(decoded.get("when").and_then(WireValue::as_timestamp), Some(sample_ts()));
        assert_eq!(decoded.get("state").and_then(WireValue::as_state), Some(MonitorState::Ok));
        assert_eq!(
            decoded.get("history"),
            Some(&WireValue::List(vec![
                WireValue::State(MonitorState::Skipped),
                WireValue::Plain(json!(3)),
            ]))
        );
        assert_eq!(decoded.get("name"), Some(&WireValue::Plain(json!("db"))));

        assert_eq!(decoded.encode(), payload);
    }

    #[test]
    fn test_malformed_tags_stay_plain_maps() {
        let bad_ts = json!({"__simplemonitor_datetime": "yesterday"});
        assert!(matches!(WireValue::decode(bad_ts), WireValue::Map(_)));

        let bad_state = json!({"__simplemonitor_monitorstate": "BROKEN"});
        assert!(matches!(WireValue::decode(bad_state), WireValue::Map(_)));

        let extra_key = json!({
            "__simplemonitor_monitorstate": "OK",
            "other": 1
        });
        assert!(matches!(WireValue::decode(extra_key), WireValue::Map(_)));

        let not_string = json!({"__simplemonitor_datetime": 5});
        assert!(matches!(WireValue::decode(not_string), WireValue::Map(_)));
    }
}
