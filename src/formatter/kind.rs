//! Identifiers for the built-in formatters.
//!
//! Keeps the mapping between configuration names and formatter variants in
//! one place so callers never compare raw strings.

use std::{fmt, str::FromStr};

use crate::log_event::FemtoLogEvent;

use super::{
    FemtoFormatter, FormatError,
    serialise::{encode_json, encode_msgpack, encode_rawjson},
};

/// Built-in formatter variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatterKind {
    /// Raw message bytes.
    Null,
    /// Full event as JSON.
    Json,
    /// Message parsed as JSON with selected metadata merged in.
    RawJson,
    /// `[<host>] [<timestamp>] <message>`.
    String,
    /// Full event as a MessagePack map.
    MessagePack,
}

impl FormatterKind {
    /// Every built-in variant in registration order.
    pub const ALL: [FormatterKind; 5] = [
        Self::Null,
        Self::Json,
        Self::RawJson,
        Self::String,
        Self::MessagePack,
    ];

    /// Return the configuration name of the formatter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Json => "json",
            Self::RawJson => "rawjson",
            Self::String => "string",
            Self::MessagePack => "msgpack",
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatterKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

impl FemtoFormatter for FormatterKind {
    fn format(&self, event: &FemtoLogEvent) -> Result<Vec<u8>, FormatError> {
        match self {
            Self::Null => Ok(event.message.as_bytes().to_vec()),
            Self::Json => encode_json(event),
            Self::RawJson => encode_rawjson(event),
            Self::String => Ok(format!(
                "[{}] [{}] {}",
                event.source_host_str(),
                event.timestamp_str(),
                event.message
            )
            .into_bytes()),
            Self::MessagePack => encode_msgpack(event),
        }
    }
}
