//! Formatter implementations and the per-transport formatter registry.
//!
//! Provides the core [`FemtoFormatter`] trait, the built-in
//! [`FormatterKind`] variants and the [`FormatterRegistry`] each transport
//! owns. Formatters are pure: the same event always encodes to the same
//! bytes.

use std::{collections::BTreeMap, fmt, sync::Arc};

use thiserror::Error;

use crate::log_event::FemtoLogEvent;

mod kind;
mod serialise;

pub use kind::FormatterKind;

/// Errors raised while encoding an event.
#[derive(Debug, Error)]
pub enum FormatError {
    /// JSON parsing or encoding failed.
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    /// MessagePack encoding failed.
    #[error("msgpack encoding failed: {0}")]
    MessagePack(#[from] rmp_serde::encode::Error),
    /// A `rawjson` message parsed as JSON but not as an object.
    #[error("rawjson message is not a JSON object")]
    NotAnObject,
    /// Neither the requested nor the default formatter is registered.
    #[error("formatter {0} is not registered")]
    Unregistered(String),
}

/// Trait for encoding log events into wire payloads.
///
/// Implementors must be thread-safe (`Send + Sync`) so a registry can be
/// read from several threads.
pub trait FemtoFormatter: Send + Sync {
    /// Encode `event` into a payload.
    fn format(&self, event: &FemtoLogEvent) -> Result<Vec<u8>, FormatError>;
}

impl<F> FemtoFormatter for F
where
    F: Fn(&FemtoLogEvent) -> Result<Vec<u8>, FormatError> + Send + Sync,
{
    fn format(&self, event: &FemtoLogEvent) -> Result<Vec<u8>, FormatError> {
        self(event)
    }
}

/// Shared formatter trait object stored in a registry.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn FemtoFormatter>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: FemtoFormatter + 'static,
    {
        Self {
            inner: Arc::new(formatter),
        }
    }

    /// Encode an event using the wrapped formatter instance.
    pub fn format(&self, event: &FemtoLogEvent) -> Result<Vec<u8>, FormatError> {
        self.inner.format(event)
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn FemtoFormatter>)")
    }
}

/// Name to formatter mapping owned by a single transport.
///
/// The registry is mutable only until it is handed to
/// [`TransportCore::with_registry`](crate::transport::TransportCore::with_registry);
/// from then on the transport only exposes shared references to it.
#[derive(Clone, Debug)]
pub struct FormatterRegistry {
    formatters: BTreeMap<String, SharedFormatter>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FormatterRegistry {
    /// Create a registry containing no formatters.
    pub fn empty() -> Self {
        Self {
            formatters: BTreeMap::new(),
        }
    }

    /// Create a registry populated with every [`FormatterKind`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for kind in FormatterKind::ALL {
            registry.register(kind.as_str(), kind);
        }
        registry
    }

    /// Register `formatter` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, formatter: F) -> &mut Self
    where
        F: FemtoFormatter + 'static,
    {
        self.formatters
            .insert(name.into(), SharedFormatter::new(formatter));
        self
    }

    /// Return true when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Look up a formatter by exact name.
    pub fn get(&self, name: &str) -> Option<&SharedFormatter> {
        self.formatters.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formatters.keys().map(String::as_str)
    }

    /// Resolve `requested`, falling back to `default` when it is absent or
    /// unregistered.
    ///
    /// Returns the name actually selected alongside the formatter.
    pub fn resolve<'a>(
        &'a self,
        requested: Option<&'a str>,
        default: &'a str,
    ) -> Result<(&'a str, &'a SharedFormatter), FormatError> {
        if let Some((name, formatter)) =
            requested.and_then(|name| self.get(name).map(|formatter| (name, formatter)))
        {
            return Ok((name, formatter));
        }
        self.get(default)
            .map(|formatter| (default, formatter))
            .ok_or_else(|| FormatError::Unregistered(default.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    //! Tests for the formatter registry.

    use super::*;
    use static_assertions::assert_impl_all;

    #[test]
    fn shared_formatter_is_send_sync() {
        assert_impl_all!(SharedFormatter: Send, Sync);
        assert_impl_all!(FormatterRegistry: Send, Sync);
    }

    #[test]
    fn builtins_are_registered() {
        let registry = FormatterRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["json", "msgpack", "null", "rawjson", "string"]);
    }

    #[test]
    fn resolve_prefers_requested_formatter() {
        let registry = FormatterRegistry::with_builtins();
        let (name, _) = registry
            .resolve(Some("string"), "null")
            .expect("string is registered");
        assert_eq!(name, "string");
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let registry = FormatterRegistry::with_builtins();
        let (name, formatter) = registry
            .resolve(Some("xml"), "json")
            .expect("json is registered");
        assert_eq!(name, "json");
        let payload = formatter.format(&FemtoLogEvent::new("x")).expect("format");
        assert!(payload.starts_with(b"{"));

        let (name, _) = registry.resolve(None, "null").expect("null is registered");
        assert_eq!(name, "null");
    }

    #[test]
    fn resolve_fails_when_default_missing() {
        let registry = FormatterRegistry::empty();
        let err = registry.resolve(None, "json").expect_err("nothing registered");
        assert!(matches!(err, FormatError::Unregistered(name) if name == "json"));
    }

    #[test]
    fn closures_register_as_formatters() {
        let mut registry = FormatterRegistry::with_builtins();
        registry.register(
            "upper",
            |event: &FemtoLogEvent| -> Result<Vec<u8>, FormatError> {
                Ok(event.message.to_uppercase().into_bytes())
            },
        );
        let (_, formatter) = registry.resolve(Some("upper"), "null").expect("registered");
        assert_eq!(
            formatter.format(&FemtoLogEvent::new("abc")).expect("format"),
            b"ABC"
        );
    }
}
