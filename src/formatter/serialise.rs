//! JSON and MessagePack encoders for log events.

use rmp_serde::Serializer;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::log_event::{EventFields, FemtoLogEvent};

use super::FormatError;

/// Wire shape shared by the `json` and `msgpack` formatters.
///
/// Field order is part of the wire format and must stay stable.
#[derive(Serialize)]
struct SerializableEvent<'a> {
    #[serde(rename = "@source")]
    source: Option<&'a str>,
    #[serde(rename = "@type")]
    event_type: Option<&'a str>,
    #[serde(rename = "@tags")]
    tags: Option<&'a [String]>,
    #[serde(rename = "@fields")]
    fields: Option<&'a EventFields>,
    #[serde(rename = "@timestamp")]
    timestamp: Option<&'a str>,
    #[serde(rename = "@source_host")]
    source_host: Option<&'a str>,
    #[serde(rename = "@source_path")]
    source_path: Option<&'a str>,
    #[serde(rename = "@message")]
    message: &'a str,
}

impl<'a> From<&'a FemtoLogEvent> for SerializableEvent<'a> {
    fn from(event: &'a FemtoLogEvent) -> Self {
        Self {
            source: event.source.as_deref(),
            event_type: event.event_type.as_deref(),
            tags: event.tags.as_deref(),
            fields: event.fields.as_ref(),
            timestamp: event.timestamp.as_deref(),
            source_host: event.source_host.as_deref(),
            source_path: event.source_path.as_deref(),
            message: &event.message,
        }
    }
}

/// Serialise the full event as a JSON object.
pub(super) fn encode_json(event: &FemtoLogEvent) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec(&SerializableEvent::from(event))?)
}

/// Serialise the full event as a MessagePack map keyed by field name.
pub(super) fn encode_msgpack(event: &FemtoLogEvent) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::with_capacity(128 + event.message.len());
    SerializableEvent::from(event).serialize(&mut Serializer::new(&mut buf).with_struct_map())?;
    Ok(buf)
}

/// Parse the message as a JSON object and merge the event's metadata into it.
///
/// Only `@source`, `@type`, `@tags`, `@source_host` and `@source_path` are
/// merged, and only when the event carries them.
pub(super) fn encode_rawjson(event: &FemtoLogEvent) -> Result<Vec<u8>, FormatError> {
    let mut object = match serde_json::from_str::<Value>(&event.message)? {
        Value::Object(object) => object,
        _ => return Err(FormatError::NotAnObject),
    };
    merge_str(&mut object, "@source", event.source.as_deref());
    merge_str(&mut object, "@type", event.event_type.as_deref());
    if let Some(tags) = &event.tags {
        object.insert(
            "@tags".into(),
            Value::Array(tags.iter().cloned().map(Value::String).collect()),
        );
    }
    merge_str(&mut object, "@source_host", event.source_host.as_deref());
    merge_str(&mut object, "@source_path", event.source_path.as_deref());
    Ok(serde_json::to_vec(&Value::Object(object))?)
}

fn merge_str(object: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        object.insert(key.to_owned(), Value::String(value.to_owned()));
    }
}
