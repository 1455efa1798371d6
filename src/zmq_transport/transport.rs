//! Public transport type exported by the crate.

use std::any::Any;

use delegate::delegate;
use log::info;

use crate::{
    config::{SharedFileConfig, TransportConfig},
    transport::{FemtoTransport, TransportBuildError, TransportCore, TransportError},
};

use super::{
    config::ZmqTransportConfig,
    socket::{ZmqSink, send_failure},
};

/// Transport pushing formatted events over a ZeroMQ PUSH or PUB socket.
pub struct ZmqTransport {
    core: TransportCore,
    config: ZmqTransportConfig,
    sink: Option<ZmqSink>,
}

impl ZmqTransport {
    /// Construct the transport and open its socket.
    pub fn new(
        config: &TransportConfig,
        file_config: SharedFileConfig,
    ) -> Result<Self, TransportBuildError> {
        let core = TransportCore::new(config, file_config)?;
        let zmq_config = ZmqTransportConfig::from_transport_config(config)?;
        Self::with_core(core, zmq_config)
    }

    /// Construct the transport from an existing core and socket settings.
    pub fn with_core(
        core: TransportCore,
        config: ZmqTransportConfig,
    ) -> Result<Self, TransportBuildError> {
        let sink = ZmqSink::open(&config)?;
        info!(
            "zmq transport ready: {} {} as {:?}",
            config.mode, config.address, config.pattern
        );
        Ok(Self {
            core,
            config,
            sink: Some(sink),
        })
    }

    /// Resolver entry point.
    pub fn factory(
        config: &TransportConfig,
        file_config: SharedFileConfig,
    ) -> Result<Box<dyn FemtoTransport>, TransportBuildError> {
        Ok(Box::new(Self::new(config, file_config)?))
    }

    pub fn config(&self) -> &ZmqTransportConfig {
        &self.config
    }

    /// True while the socket is open.
    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    delegate! {
        to self.core {
            pub fn hostname(&self) -> &str;
            pub fn default_formatter(&self) -> &str;
        }
    }

    fn release(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
    }
}

impl FemtoTransport for ZmqTransport {
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
        let sink = self.sink.as_ref().ok_or(TransportError::Closed)?;
        let timestamp = TransportCore::derive_timestamp(timestamp);
        for line in lines {
            let payload = self.core.format_event(filename, &timestamp, line)?;
            sink.send(payload)
                .map_err(|err| send_failure(&mut self.core, err, sink.endpoint()))?;
        }
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        if !self.core.is_valid() {
            return Err(TransportError::Invalid);
        }
        self.release();
        self.sink = Some(ZmqSink::open(&self.config)?);
        info!("zmq transport reconnected to {}", self.config.address);
        Ok(())
    }

    fn interrupt(&mut self) -> bool {
        self.release();
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for ZmqTransport {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ZmqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqTransport")
            .field("config", &self.config)
            .field("open", &self.sink.is_some())
            .field("valid", &self.core.is_valid())
            .finish()
    }
}
