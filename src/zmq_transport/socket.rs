//! Ownership of the ZeroMQ context and socket.

use std::io;

use log::{debug, warn};

use crate::transport::{TransportBuildError, TransportCore, TransportError};

use super::config::{ConnectMode, ZmqTransportConfig};

/// An open socket together with the context that owns it.
///
/// Dropping the sink closes the socket before terminating the context, so
/// any bound endpoint is released once `close` or `drop` returns.
pub struct ZmqSink {
    socket: zmq::Socket,
    context: zmq::Context,
    endpoint: String,
}

impl ZmqSink {
    /// Create the context and socket, apply the high-water mark and linger,
    /// then bind or connect.
    pub fn open(config: &ZmqTransportConfig) -> Result<Self, TransportBuildError> {
        let context = zmq::Context::new();
        let socket = context
            .socket(config.pattern.socket_type())
            .map_err(io::Error::other)?;
        if let Some(hwm) = config.hwm {
            socket.set_sndhwm(hwm).map_err(io::Error::other)?;
        }
        socket
            .set_linger(config.linger_ms)
            .map_err(io::Error::other)?;

        let attached = match config.mode {
            ConnectMode::Bind => socket.bind(&config.address),
            ConnectMode::Connect => socket.connect(&config.address),
        };
        attached.map_err(|err| TransportBuildError::Endpoint {
            mode: config.mode.as_str(),
            address: config.address.clone(),
            source: io::Error::other(err),
        })?;

        debug!(
            "zmq {:?} socket {} {}",
            config.pattern,
            config.mode,
            config.address
        );
        Ok(Self {
            socket,
            context,
            endpoint: config.address.clone(),
        })
    }

    /// Send one payload as a single message, blocking under backpressure.
    pub fn send(&self, payload: Vec<u8>) -> Result<(), zmq::Error> {
        self.socket.send(payload, 0)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Close the socket and terminate the context.
    pub fn close(self) {
        let Self {
            socket,
            context,
            endpoint,
        } = self;
        drop(socket);
        drop(context);
        debug!("zmq socket for {endpoint} closed");
    }
}

/// True for send errors no reconnect can repair.
pub fn is_fatal(err: zmq::Error) -> bool {
    matches!(
        err,
        zmq::Error::EFSM
            | zmq::Error::ENOTSUP
            | zmq::Error::ENOCOMPATPROTO
            | zmq::Error::EPROTONOSUPPORT
    )
}

/// Log and classify a send failure.
///
/// Fatal errors mark `core` invalid and become [`TransportError::Fatal`];
/// everything else is a recoverable [`TransportError::Sink`].
pub fn send_failure(core: &mut TransportCore, err: zmq::Error, endpoint: &str) -> TransportError {
    warn!("zmq send to {endpoint} failed: {err}");
    let io_err = io::Error::other(err);
    if is_fatal(err) {
        core.invalidate();
        TransportError::Fatal(io_err)
    } else {
        TransportError::Sink(io_err)
    }
}
