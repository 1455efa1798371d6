//! Resolution of configured transport identifiers.
//!
//! Operators select a transport by name. A short name (`zmq`, `stdout`)
//! selects a built-in; a dotted path (`<location>.<TypeName>`) selects any
//! transport registered under that qualified name, built-in or custom.
//! Both forms resolve through one explicit table of factories.

use log::debug;
use once_cell::sync::Lazy;

use crate::{
    config::{ConfigError, SharedFileConfig, TransportConfig},
    stdout_transport::StdoutTransport,
    zmq_transport::ZmqTransport,
};

use super::{FemtoTransport, TransportBuildError};

/// Separator between the location and type name of a qualified transport.
pub const PATH_SEPARATOR: char = '.';

/// Constructor stored in the resolver table.
pub type TransportFactory =
    fn(&TransportConfig, SharedFileConfig) -> Result<Box<dyn FemtoTransport>, TransportBuildError>;

/// One resolvable transport.
#[derive(Clone, Debug)]
pub struct TransportEntry {
    short_name: Option<String>,
    location: String,
    type_name: String,
    factory: TransportFactory,
}

impl TransportEntry {
    /// Short name, present for built-ins only.
    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fully qualified `<location>.<TypeName>` name.
    pub fn qualified_name(&self) -> String {
        format!("{}{PATH_SEPARATOR}{}", self.location, self.type_name)
    }

    fn matches_short(&self, name: &str) -> bool {
        self.short_name
            .as_deref()
            .is_some_and(|short| short.eq_ignore_ascii_case(name))
    }

    fn matches_path(&self, location: &str, type_name: &str) -> bool {
        self.location == location && self.type_name == type_name
    }
}

/// Built-in transports as `(short name, location, type name, factory)`.
const BUILTIN_TRANSPORTS: [(&str, &str, &str, TransportFactory); 2] = [
    (
        "stdout",
        "femtoship.stdout_transport",
        "StdoutTransport",
        StdoutTransport::factory,
    ),
    (
        "zmq",
        "femtoship.zmq_transport",
        "ZmqTransport",
        ZmqTransport::factory,
    ),
];

static DEFAULT_RESOLVER: Lazy<TransportResolver> = Lazy::new(TransportResolver::new);

/// Resolve and construct the transport named by `config` using the built-ins.
pub fn create_transport(
    config: &TransportConfig,
    file_config: SharedFileConfig,
) -> Result<Box<dyn FemtoTransport>, TransportBuildError> {
    DEFAULT_RESOLVER.resolve(config, file_config)
}

/// Split a dotted transport path at its last separator.
///
/// Both halves must be non-empty.
pub fn split_transport_path(identifier: &str) -> Result<(&str, &str), ConfigError> {
    identifier
        .rsplit_once(PATH_SEPARATOR)
        .filter(|(location, type_name)| !location.is_empty() && !type_name.is_empty())
        .ok_or_else(|| ConfigError::InvalidTransportPath(identifier.to_owned()))
}

/// Table mapping transport identifiers to factories.
#[derive(Clone, Debug)]
pub struct TransportResolver {
    entries: Vec<TransportEntry>,
}

impl Default for TransportResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportResolver {
    /// Create a resolver holding the built-in transports.
    pub fn new() -> Self {
        let entries = BUILTIN_TRANSPORTS
            .iter()
            .map(|(short, location, type_name, factory)| TransportEntry {
                short_name: Some((*short).to_owned()),
                location: (*location).to_owned(),
                type_name: (*type_name).to_owned(),
                factory: *factory,
            })
            .collect();
        Self { entries }
    }

    /// Create a resolver with no transports.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a custom transport reachable as `<location>.<type_name>`.
    ///
    /// A later registration under the same qualified name replaces the
    /// earlier one.
    pub fn register(
        &mut self,
        location: impl Into<String>,
        type_name: impl Into<String>,
        factory: TransportFactory,
    ) -> &mut Self {
        let location = location.into();
        let type_name = type_name.into();
        self.entries
            .retain(|entry| !entry.matches_path(&location, &type_name));
        self.entries.push(TransportEntry {
            short_name: None,
            location,
            type_name,
            factory,
        });
        self
    }

    /// Registered entries in registration order.
    pub fn entries(&self) -> &[TransportEntry] {
        &self.entries
    }

    /// Find the entry named by `identifier` without constructing anything.
    pub fn lookup(&self, identifier: &str) -> Result<&TransportEntry, ConfigError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ConfigError::MissingKey("transport"));
        }
        let found = if identifier.contains(PATH_SEPARATOR) {
            let (location, type_name) = split_transport_path(identifier)?;
            self.entries
                .iter()
                .find(|entry| entry.matches_path(location, type_name))
        } else {
            self.entries
                .iter()
                .find(|entry| entry.matches_short(identifier))
        };
        found.ok_or_else(|| ConfigError::UnknownTransport(identifier.to_owned()))
    }

    /// Resolve the transport named in `config` and construct it.
    ///
    /// Construction errors are returned unchanged.
    pub fn resolve(
        &self,
        config: &TransportConfig,
        file_config: SharedFileConfig,
    ) -> Result<Box<dyn FemtoTransport>, TransportBuildError> {
        let entry = self.lookup(config.transport())?;
        debug!(
            "resolved transport {} to {}",
            config.transport(),
            entry.qualified_name()
        );
        (entry.factory)(config, file_config)
    }
}
