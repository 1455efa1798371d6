//! Per-file configuration keyed by path or glob.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;

use crate::log_event::EventFields;

/// File configuration shared between the tailer and a transport.
pub type SharedFileConfig = Arc<RwLock<FileConfig>>;

/// Settings attached to a single file path or glob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileSettings {
    /// Formatter name overriding the transport default.
    pub message_format: Option<String>,
    /// Event type copied into every event.
    pub event_type: Option<String>,
    /// Tags copied into every event.
    pub tags: Vec<String>,
    /// Structured fields copied into every event.
    pub fields: EventFields,
}

impl FileSettings {
    pub fn with_message_format(mut self, format: impl Into<String>) -> Self {
        self.message_format = Some(format.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Per-file settings table.
///
/// Entries are keyed by the section name they were configured under, which
/// is either a concrete path or a glob. Paths expanded from a glob are
/// registered with [`add_glob`](Self::add_glob) and resolve to that glob's
/// settings. Unknown paths resolve to the defaults.
#[derive(Clone, Debug, Default)]
pub struct FileConfig {
    entries: BTreeMap<String, FileSettings>,
    expanded: BTreeMap<String, String>,
    defaults: FileSettings,
}

impl FileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the configuration for sharing with a transport.
    pub fn shared(self) -> SharedFileConfig {
        Arc::new(RwLock::new(self))
    }

    /// Add or replace the settings for a path or glob.
    pub fn with_entry(mut self, key: impl Into<String>, settings: FileSettings) -> Self {
        self.insert(key, settings);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, settings: FileSettings) {
        self.entries.insert(key.into(), settings);
    }

    /// Record that `paths` were expanded from `glob`.
    pub fn add_glob<I, S>(&mut self, glob: &str, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            self.expanded.insert(path.into(), glob.to_owned());
        }
    }

    /// Configured keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Settings governing `filename`.
    pub fn settings(&self, filename: &str) -> &FileSettings {
        self.entries
            .get(filename)
            .or_else(|| {
                self.expanded
                    .get(filename)
                    .and_then(|glob| self.entries.get(glob))
            })
            .unwrap_or(&self.defaults)
    }

    pub fn message_format(&self, filename: &str) -> Option<&str> {
        self.settings(filename).message_format.as_deref()
    }

    pub fn event_type(&self, filename: &str) -> Option<&str> {
        self.settings(filename).event_type.as_deref()
    }

    pub fn tags(&self, filename: &str) -> &[String] {
        &self.settings(filename).tags
    }

    pub fn fields(&self, filename: &str) -> &EventFields {
        &self.settings(filename).fields
    }
}
