//! State and behaviour shared by every transport.

use chrono::Utc;
use log::warn;

use crate::{
    config::{ConfigError, FormatterFallback, SharedFileConfig, TransportConfig},
    formatter::{FormatError, FormatterRegistry},
    log_event::FemtoLogEvent,
    rate_limited_warner::RateLimitedWarner,
};

/// `chrono` pattern producing ISO-8601 UTC timestamps with a literal `Z`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Helper composed into each transport.
///
/// Captures the host name, the default formatter and the formatter registry
/// at construction time and holds the validity flag. The registry is owned
/// exclusively and never mutated after construction.
#[derive(Debug)]
pub struct TransportCore {
    hostname: String,
    default_formatter: String,
    formatters: FormatterRegistry,
    file_config: SharedFileConfig,
    fallback: FormatterFallback,
    fallback_warner: RateLimitedWarner,
    valid: bool,
}

impl TransportCore {
    /// Build the core with the built-in formatters.
    pub fn new(config: &TransportConfig, file_config: SharedFileConfig) -> Result<Self, ConfigError> {
        Self::with_registry(config, file_config, FormatterRegistry::with_builtins())
    }

    /// Build the core with a caller-supplied registry.
    ///
    /// Fails when the configured default formatter is not registered.
    pub fn with_registry(
        config: &TransportConfig,
        file_config: SharedFileConfig,
        formatters: FormatterRegistry,
    ) -> Result<Self, ConfigError> {
        let default_formatter = config.format().to_owned();
        if !formatters.contains(&default_formatter) {
            return Err(ConfigError::UnknownFormatter(default_formatter));
        }
        Ok(Self {
            hostname: config.hostname().to_owned(),
            default_formatter,
            formatters,
            file_config,
            fallback: config.formatter_fallback(),
            fallback_warner: RateLimitedWarner::default(),
            valid: true,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn default_formatter(&self) -> &str {
        &self.default_formatter
    }

    pub fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    pub fn file_config(&self) -> &SharedFileConfig {
        &self.file_config
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the transport permanently unusable. There is no way back.
    pub fn invalidate(&mut self) {
        if self.valid {
            warn!("transport for host {} marked invalid", self.hostname);
        }
        self.valid = false;
    }

    /// Return `explicit` when it is non-empty, otherwise the current UTC time.
    pub fn derive_timestamp(explicit: Option<&str>) -> String {
        match explicit {
            Some(timestamp) if !timestamp.is_empty() => timestamp.to_owned(),
            _ => Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Assemble the event for one line of `filename`.
    pub fn build_event(&self, filename: &str, timestamp: &str, line: &str) -> FemtoLogEvent {
        let files = self.file_config.read();
        let settings = files.settings(filename);
        FemtoLogEvent {
            source: Some(format!("file://{}{}", self.hostname, filename)),
            event_type: settings.event_type.clone(),
            tags: Some(settings.tags.clone()),
            fields: Some(settings.fields.clone()),
            timestamp: Some(timestamp.to_owned()),
            source_host: Some(self.hostname.clone()),
            source_path: Some(filename.to_owned()),
            message: line.to_owned(),
        }
    }

    /// Format one line of `filename`.
    ///
    /// Uses the file's `message_format` when it names a registered
    /// formatter and the transport default otherwise. The payload is
    /// returned exactly as the formatter produced it.
    pub fn format_event(
        &self,
        filename: &str,
        timestamp: &str,
        line: &str,
    ) -> Result<Vec<u8>, FormatError> {
        let requested = self
            .file_config
            .read()
            .message_format(filename)
            .map(str::to_owned);
        let (selected, formatter) = self
            .formatters
            .resolve(requested.as_deref(), &self.default_formatter)?;
        if let Some(requested) = requested.as_deref() {
            if requested != selected {
                self.note_fallback(filename, requested);
            }
        }
        formatter.format(&self.build_event(filename, timestamp, line))
    }

    /// Register paths expanded from `glob` with the file configuration.
    pub fn add_glob(&self, glob: &str, paths: &[String]) {
        self.file_config.write().add_glob(glob, paths.iter().cloned());
    }

    fn note_fallback(&self, filename: &str, requested: &str) {
        if self.fallback != FormatterFallback::Warn {
            return;
        }
        self.fallback_warner.record();
        self.fallback_warner.warn_if_due(|count| {
            warn!(
                "formatter {requested} requested for {filename} is not registered; \
                 used {} for {count} events",
                self.default_formatter
            );
        });
    }
}
