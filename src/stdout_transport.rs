//! Stream-based transport implementation.
//!
//! This module defines `StdoutTransport`, which formats each tailed line and
//! writes it, newline terminated, to a stream. Standard output is used by
//! default; any `io::Write` can be supplied. Writes happen on the calling
//! thread and the stream is flushed once per batch.

use std::{
    any::Any,
    io::{self, Write},
};

use delegate::delegate;
use log::warn;

use crate::{
    config::{SharedFileConfig, TransportConfig},
    transport::{FemtoTransport, TransportBuildError, TransportCore, TransportError},
};

/// Transport writing formatted events to an `io::Write` stream.
pub struct StdoutTransport {
    core: TransportCore,
    writer: Option<Box<dyn Write + Send>>,
}

impl StdoutTransport {
    /// Create a transport writing to standard output.
    pub fn new(
        config: &TransportConfig,
        file_config: SharedFileConfig,
    ) -> Result<Self, TransportBuildError> {
        let core = TransportCore::new(config, file_config)?;
        Ok(Self::with_writer(core, io::stdout()))
    }

    /// Create a transport writing to an arbitrary stream.
    pub fn with_writer<W>(core: TransportCore, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            core,
            writer: Some(Box::new(writer)),
        }
    }

    /// Resolver entry point.
    pub fn factory(
        config: &TransportConfig,
        file_config: SharedFileConfig,
    ) -> Result<Box<dyn FemtoTransport>, TransportBuildError> {
        Ok(Box::new(Self::new(config, file_config)?))
    }

    delegate! {
        to self.core {
            pub fn hostname(&self) -> &str;
            pub fn default_formatter(&self) -> &str;
        }
    }
}

impl FemtoTransport for StdoutTransport {
    fn core(&self) -> &TransportCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TransportCore {
        &mut self.core
    }

    fn callback_at(
        &mut self,
        filename: &str,
        lines: &[String],
        timestamp: Option<&str>,
    ) -> Result<(), TransportError> {
        if !self.core.is_valid() {
            return Err(TransportError::Invalid);
        }
        let writer = self.writer.as_mut().ok_or(TransportError::Closed)?;
        if lines.is_empty() {
            return Ok(());
        }
        let timestamp = TransportCore::derive_timestamp(timestamp);
        for line in lines {
            let mut payload = self.core.format_event(filename, &timestamp, line)?;
            payload.push(b'\n');
            writer.write_all(&payload).map_err(TransportError::Sink)?;
        }
        writer.flush().map_err(TransportError::Sink)
    }

    fn interrupt(&mut self) -> bool {
        if let Some(mut writer) = self.writer.take() {
            if let Err(err) = writer.flush() {
                warn!("StdoutTransport: flush on interrupt failed: {err}");
            }
        }
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for StdoutTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutTransport")
            .field("open", &self.writer.is_some())
            .field("valid", &self.core.is_valid())
            .finish()
    }
}
