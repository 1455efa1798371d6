//! ZeroMQ transport implementation.
//!
//! This module defines `ZmqTransport`, a transport that formats each tailed
//! line and sends it as one message on a PUSH or PUB socket. The socket is
//! either bound (this process is the stable endpoint) or connected (this
//! process dials a collector). Sends block when a PUSH socket reaches its
//! high-water mark and drop when a PUB socket does.

mod config;
mod socket;
mod transport;


pub use config::{
    ConnectMode, DEFAULT_ADDRESS, DEFAULT_LINGER_MS, SocketPattern, ZmqTransportConfig,
    validate_address,
};
pub use transport::ZmqTransport;
