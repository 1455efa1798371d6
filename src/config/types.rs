//! Global transport configuration and the errors raised while reading it.

use std::{collections::BTreeMap, fmt, fs, io, str::FromStr};

use log::warn;
use thiserror::Error;

use crate::formatter::FormatterKind;

/// Errors that may occur while reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key was missing or empty.
    #[error("missing required configuration key: {0}")]
    MissingKey(&'static str),
    /// No transport is registered under the requested name.
    #[error("unknown transport: {0}")]
    UnknownTransport(String),
    /// A dotted transport path could not be split into location and type.
    #[error("invalid transport {0}: expected <location>.<TypeName>")]
    InvalidTransportPath(String),
    /// The default formatter is not registered.
    #[error("default formatter {0} is not registered")]
    UnknownFormatter(String),
    /// A sink address is malformed.
    #[error("invalid address {address}: {reason}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why the address was rejected.
        reason: &'static str,
    },
    /// A setting held a value that could not be interpreted.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// The configuration key.
        key: String,
        /// The rejected value.
        value: String,
    },
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed to load.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The configuration file was empty.
    #[error("{0} is an empty file")]
    EmptyFile(String),
    /// The configuration file could not be decoded.
    #[error("failed to decode {path} as {encoding}")]
    Decode {
        /// The path that failed to decode.
        path: String,
        /// The encoding label used.
        encoding: String,
    },
    /// The encoding label is unknown.
    #[error("unknown encoding {0}")]
    UnknownEncoding(String),
    /// The INI text could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// How a transport reacts when a file requests an unregistered formatter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatterFallback {
    /// Use the default formatter without comment.
    #[default]
    Silent,
    /// Use the default formatter and emit a rate-limited warning.
    Warn,
}

impl FromStr for FormatterFallback {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "warn" | "warning" => Ok(Self::Warn),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FormatterFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Silent => "silent",
            Self::Warn => "warn",
        })
    }
}

/// Global settings consumed by the transport resolver and every transport.
///
/// Core keys are typed; transport-specific keys (`zeromq_address`, `mode`,
/// `max_failure`, ...) live in an ordered string map and are parsed by the
/// transport that consumes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    transport: String,
    hostname: String,
    format: String,
    formatter_fallback: FormatterFallback,
    settings: BTreeMap<String, String>,
}

impl TransportConfig {
    /// Create a configuration selecting `transport` with default settings.
    pub fn new(transport: impl Into<String>) -> Self {
        Self {
            transport: transport.into(),
            hostname: detect_hostname(),
            format: FormatterKind::Null.as_str().to_owned(),
            formatter_fallback: FormatterFallback::default(),
            settings: BTreeMap::new(),
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the default formatter name.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_formatter_fallback(mut self, fallback: FormatterFallback) -> Self {
        self.formatter_fallback = fallback;
        self
    }

    /// Set a transport-specific setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set any key, routing core keys to their typed fields.
    ///
    /// An unrecognised `formatter_fallback` value is logged and leaves the
    /// policy unchanged; use [`apply`](Self::apply) to reject it instead.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "transport" => self.transport = value,
            "hostname" => self.hostname = value,
            "format" => self.format = value,
            "formatter_fallback" => match value.trim().parse() {
                Ok(fallback) => self.formatter_fallback = fallback,
                Err(()) => warn!(
                    "ignoring formatter_fallback {value:?}; keeping {}",
                    self.formatter_fallback
                ),
            },
            _ => {
                self.settings.insert(key, value);
            }
        }
    }

    /// Transport identifier; either a short name or a dotted path.
    pub fn transport(&self) -> &str {
        &self.transport
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Default formatter name.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn formatter_fallback(&self) -> FormatterFallback {
        self.formatter_fallback
    }

    /// Raw transport-specific setting, ignoring empty values.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Parse a transport-specific setting into `T`.
    pub fn parse_setting<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.setting(key)
            .map(|value| {
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_owned(),
                    value: value.to_owned(),
                })
            })
            .transpose()
    }

    /// Apply a `key = value` pair read from a configuration source.
    ///
    /// Unlike [`set`](Self::set) this validates the typed keys.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if key == "formatter_fallback" {
            self.formatter_fallback =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_owned(),
                    value: value.to_owned(),
                })?;
            return Ok(());
        }
        self.set(key, value);
        Ok(())
    }
}

/// Best-effort host name detection used when none is configured.
pub(crate) fn detect_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/proc/sys/kernel/hostname").ok())
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}
