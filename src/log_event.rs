//! Log event representation for the femtoship transports.
//!
//! This module defines the `FemtoLogEvent` struct assembled for every tailed
//! line before it is handed to a formatter. Events are transient: a transport
//! builds one per line inside a single `callback` and drops it once the
//! payload has been produced.

use std::collections::BTreeMap;
use std::fmt;

/// Structured key-value pairs attached to a file's events.
pub type EventFields = BTreeMap<String, String>;

/// A single tailed line together with the metadata of the file it came from.
///
/// Every field except `message` is optional so formatters can be exercised
/// against partial events. [`TransportCore::build_event`] always fills the
/// synthesised fields (`source`, `timestamp`, `source_host`, `source_path`)
/// and copies `type`, `tags` and `fields` from the file configuration.
///
/// [`TransportCore::build_event`]: crate::transport::TransportCore::build_event
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FemtoLogEvent {
    /// Synthesised URI of the form `file://<host><path>`.
    pub source: Option<String>,
    /// Per-file event type.
    pub event_type: Option<String>,
    /// Per-file tags.
    pub tags: Option<Vec<String>>,
    /// Per-file structured fields.
    pub fields: Option<EventFields>,
    /// ISO-8601 UTC timestamp.
    pub timestamp: Option<String>,
    /// Host name of the shipping agent.
    pub source_host: Option<String>,
    /// Path of the file the line was read from.
    pub source_path: Option<String>,
    /// Raw line content.
    pub message: String,
}

impl FemtoLogEvent {
    /// Construct an event carrying only `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_fields(mut self, fields: EventFields) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_source_host(mut self, host: impl Into<String>) -> Self {
        self.source_host = Some(host.into());
        self
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Host name or an empty string when unset.
    pub fn source_host_str(&self) -> &str {
        self.source_host.as_deref().unwrap_or_default()
    }

    /// Timestamp or an empty string when unset.
    pub fn timestamp_str(&self) -> &str {
        self.timestamp.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for FemtoLogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.source_path.as_deref().unwrap_or("<unknown>"),
            self.message
        )
    }
}
