//! The transport contract shared by every sink.
//!
//! A transport receives batches of tailed lines through
//! [`FemtoTransport::callback`] and delivers one formatted payload per line
//! to its sink. Behaviour common to all sinks (timestamps, event assembly,
//! formatter dispatch, validity) lives in [`TransportCore`], which each
//! concrete transport owns and exposes through [`FemtoTransport::core`].

use std::{any::Any, fmt, io};

use thiserror::Error;

use crate::{config::ConfigError, formatter::FormatError};

mod common;
mod resolver;

pub use common::TransportCore;
pub use resolver::{
    TransportEntry, TransportFactory, TransportResolver, create_transport, split_transport_path,
};

/// Errors raised while constructing a transport.
#[derive(Debug, Error)]
pub enum TransportBuildError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Binding or connecting the sink endpoint failed.
    #[error("failed to {mode} {address}: {source}")]
    Endpoint {
        /// `bind` or `connect`.
        mode: &'static str,
        /// The endpoint address.
        address: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// Any other I/O failure while opening the sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised while driving a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport was interrupted and its sink released.
    #[error("transport is closed")]
    Closed,
    /// The transport marked itself permanently invalid.
    #[error("transport is no longer valid")]
    Invalid,
    /// A line could not be formatted.
    #[error("failed to format event: {0}")]
    Format(#[from] FormatError),
    /// Delivery failed; the sink may recover after `reconnect`.
    #[error("sink error: {0}")]
    Sink(#[source] io::Error),
    /// Delivery failed in a way the sink cannot recover from.
    #[error("fatal sink error: {0}")]
    Fatal(#[source] io::Error),
    /// Rebuilding the sink failed.
    #[error("reconnect failed: {0}")]
    Reconnect(#[from] TransportBuildError),
}

impl TransportError {
    /// True when the caller may `reconnect` and retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Sink(_) | Self::Reconnect(_))
    }
}

/// Trait implemented by all transports.
///
/// Transports are driven by a single thread: `callback` is invoked serially
/// and may block while the sink applies backpressure. Every method other
/// than [`core`](Self::core), [`core_mut`](Self::core_mut) and
/// [`as_any`](Self::as_any) has a default implementation; concrete
/// transports override the lifecycle hooks their sink needs.
pub trait FemtoTransport: Send {
    /// Shared state and helpers owned by the transport.
    fn core(&self) -> &TransportCore;

    fn core_mut(&mut self) -> &mut TransportCore;

    /// Deliver `lines` read from `filename` using a fresh batch timestamp.
    fn callback(&mut self, filename: &str, lines: &[String]) -> Result<(), TransportError> {
        self.callback_at(filename, lines, None)
    }

    /// Deliver `lines` read from `filename`.
    ///
    /// Every line in the batch shares `timestamp`, or a single timestamp
    /// derived at call time when it is `None`. Lines are delivered in order.
    /// The base implementation delivers nothing and succeeds.
    fn callback_at(
        &mut self,
        filename: &str,
        lines: &[String],
        timestamp: Option<&str>,
    ) -> Result<(), TransportError> {
        let _ = (filename, lines, timestamp);
        Ok(())
    }

    /// Tear down and rebuild the sink after a recoverable failure.
    fn reconnect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Release sink resources on operator-initiated shutdown.
    ///
    /// Never fails; cleanup problems are logged.
    fn interrupt(&mut self) -> bool {
        true
    }

    /// Last chance to clean up after an error the caller does not understand.
    fn unhandled(&mut self) -> bool {
        true
    }

    /// False once the transport has detected an irrecoverable sink failure.
    fn is_valid(&self) -> bool {
        self.core().is_valid()
    }

    /// Return `explicit` when non-empty, otherwise the current UTC time.
    fn derive_timestamp(&self, explicit: Option<&str>) -> String {
        TransportCore::derive_timestamp(explicit)
    }

    /// Format one line of `filename` with the formatter configured for it.
    fn format_event(
        &self,
        filename: &str,
        timestamp: &str,
        line: &str,
    ) -> Result<Vec<u8>, FormatError> {
        self.core().format_event(filename, timestamp, line)
    }

    /// Register paths expanded from `glob` with the file configuration.
    fn add_glob(&self, glob: &str, paths: &[String]) {
        self.core().add_glob(glob, paths);
    }

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn FemtoTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core();
        f.debug_struct("FemtoTransport")
            .field("hostname", &core.hostname())
            .field("default_formatter", &core.default_formatter())
            .field("valid", &self.is_valid())
            .finish()
    }
}
