//! Output transports for a log-shipping agent.
//!
//! A transport receives batches of tailed lines tagged with their file name,
//! assembles one [`FemtoLogEvent`] per line, encodes it with a formatter from
//! its [`FormatterRegistry`] and hands the payload to its sink. Transports
//! are chosen by name through a [`TransportResolver`].

pub mod config;
pub mod driver;
pub mod formatter;
pub mod log_event;
pub mod rate_limited_warner;
pub mod stdout_transport;
pub mod transport;
pub mod zmq_transport;

pub use config::{
    ConfigError, FileConfig, FileSettings, FormatterFallback, SharedFileConfig, TransportConfig,
};
pub use driver::{BackoffPolicy, DriverConfig, TransportDriver};
pub use formatter::{FemtoFormatter, FormatError, FormatterKind, FormatterRegistry, SharedFormatter};
pub use log_event::{EventFields, FemtoLogEvent};
pub use stdout_transport::StdoutTransport;
pub use transport::{
    FemtoTransport, TransportBuildError, TransportCore, TransportError, TransportResolver,
    create_transport,
};
pub use zmq_transport::{ConnectMode, SocketPattern, ZmqTransport, ZmqTransportConfig};
