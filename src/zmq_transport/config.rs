//! Settings consumed by the ZeroMQ transport.
//!
//! Parsed from the transport-specific keys of a
//! [`TransportConfig`](crate::config::TransportConfig) before any socket is
//! created, so configuration mistakes never touch the network.

use std::{fmt, str::FromStr};

use crate::config::{ConfigError, TransportConfig};

/// Default endpoint when `zeromq_address` is not configured.
pub const DEFAULT_ADDRESS: &str = "tcp://localhost:2120";
/// Default time in milliseconds pending messages may delay socket teardown.
pub const DEFAULT_LINGER_MS: i32 = 1000;

/// Endpoint transports understood by libzmq.
const SCHEMES: [&str; 8] = ["tcp", "ipc", "inproc", "pgm", "epgm", "tipc", "vmci", "ws"];

/// Messaging pattern of the outbound socket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SocketPattern {
    /// Fan out to every subscriber; drops when the HWM is reached.
    Pub,
    /// Round-robin to pullers; blocks when the HWM is reached.
    #[default]
    Push,
}

impl SocketPattern {
    pub(crate) fn socket_type(self) -> zmq::SocketType {
        match self {
            Self::Pub => zmq::PUB,
            Self::Push => zmq::PUSH,
        }
    }
}

impl FromStr for SocketPattern {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pub" => Ok(Self::Pub),
            "push" => Ok(Self::Push),
            _ => Err(()),
        }
    }
}

/// Whether this process owns the endpoint or dials out to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectMode {
    /// Listen on the address.
    Bind,
    /// Dial the address.
    #[default]
    Connect,
}

impl ConnectMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::Connect => "connect",
        }
    }
}

impl fmt::Display for ConnectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bind" => Ok(Self::Bind),
            "connect" => Ok(Self::Connect),
            _ => Err(()),
        }
    }
}

/// Configuration object describing how to open the ZeroMQ socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZmqTransportConfig {
    pub address: String,
    pub pattern: SocketPattern,
    /// Send high-water mark; `None` keeps the libzmq default. A configured
    /// `0` is treated as unset.
    pub hwm: Option<i32>,
    pub mode: ConnectMode,
    pub linger_ms: i32,
}

impl Default for ZmqTransportConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.into(),
            pattern: SocketPattern::default(),
            hwm: None,
            mode: ConnectMode::default(),
            linger_ms: DEFAULT_LINGER_MS,
        }
    }
}

impl ZmqTransportConfig {
    /// Read `zeromq_address`, `zeromq_pattern`, `zeromq_hwm`,
    /// `zeromq_linger_ms` and `mode`.
    pub fn from_transport_config(config: &TransportConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let address = config
            .setting("zeromq_address")
            .map_or(defaults.address, str::to_owned);
        validate_address(&address)?;

        let hwm = config
            .parse_setting::<u32>("zeromq_hwm")?
            .filter(|hwm| *hwm != 0)
            .map(|hwm| {
                i32::try_from(hwm).map_err(|_| ConfigError::InvalidValue {
                    key: "zeromq_hwm".into(),
                    value: hwm.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            address,
            pattern: config
                .parse_setting("zeromq_pattern")?
                .unwrap_or(defaults.pattern),
            hwm,
            mode: config.parse_setting("mode")?.unwrap_or(defaults.mode),
            linger_ms: config
                .parse_setting("zeromq_linger_ms")?
                .unwrap_or(defaults.linger_ms),
        })
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_mode(mut self, mode: ConnectMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_pattern(mut self, pattern: SocketPattern) -> Self {
        self.pattern = pattern;
        self
    }
}

/// Reject addresses that are not `<scheme>://<endpoint>` with a known scheme.
pub fn validate_address(address: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidAddress {
        address: address.to_owned(),
        reason,
    };
    let (scheme, endpoint) = address
        .split_once("://")
        .ok_or_else(|| invalid("expected <transport>://<endpoint>"))?;
    if !SCHEMES.contains(&scheme) {
        return Err(invalid("unsupported transport"));
    }
    if endpoint.trim().is_empty() {
        return Err(invalid("missing endpoint"));
    }
    Ok(())
}
