//! Caller-side retry loop for transports.
//!
//! `TransportDriver` owns a transport and encodes the usual agent loop:
//! deliver a batch, and on a recoverable failure back off, `reconnect` and
//! retry the whole batch. Delivery is at-least-once; lines that left before
//! the failure are sent again.

mod backoff;
mod config;

#[cfg(test)]
mod tests;

use std::{thread, time::Instant};

use log::warn;

use crate::{
    rate_limited_warner::RateLimitedWarner,
    transport::{FemtoTransport, TransportError},
};

pub use backoff::BackoffState;
pub use config::{
    BackoffPolicy, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_CAP, DEFAULT_BACKOFF_DEADLINE,
    DEFAULT_BACKOFF_RESET, DEFAULT_MAX_FAILURE, DriverConfig,
};

/// Drives a transport serially, retrying recoverable failures.
pub struct TransportDriver<T: FemtoTransport + ?Sized = dyn FemtoTransport> {
    transport: Box<T>,
    max_failure: u32,
    backoff: BackoffState,
    warner: RateLimitedWarner,
}

impl<T: FemtoTransport + ?Sized> TransportDriver<T> {
    pub fn new(transport: Box<T>, config: DriverConfig) -> Self {
        Self {
            transport,
            max_failure: config.max_failure,
            backoff: BackoffState::new(config.backoff),
            warner: RateLimitedWarner::new(config.warn_interval),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Deliver `lines` from `filename`, retrying until success.
    ///
    /// Every attempt reuses the timestamp derived for the first one. Gives up
    /// and returns the last error after `max_failure` consecutive recoverable
    /// failures or once the backoff deadline passes. Any other error is
    /// passed to `unhandled` and returned immediately.
    pub fn ship(&mut self, filename: &str, lines: &[String]) -> Result<(), TransportError> {
        if !self.transport.is_valid() {
            return Err(TransportError::Invalid);
        }
        let timestamp = self.transport.derive_timestamp(None);
        let mut failures = 0u32;
        let mut reconnect_first = false;
        loop {
            let now = Instant::now();
            let attempt = if reconnect_first {
                self.transport
                    .reconnect()
                    .and_then(|()| self.transport.callback_at(filename, lines, Some(&timestamp)))
            } else {
                self.transport.callback_at(filename, lines, Some(&timestamp))
            };

            let err = match attempt {
                Ok(()) => {
                    self.backoff.record_success(now);
                    self.warner.flush(|count| {
                        warn!("TransportDriver recovered after {count} failed attempts");
                    });
                    return Ok(());
                }
                Err(err) if err.is_recoverable() => err,
                Err(err) => {
                    warn!("TransportDriver giving up on {filename}: {err}");
                    self.transport.unhandled();
                    return Err(err);
                }
            };

            failures += 1;
            self.warner.record();
            self.warner.warn_if_due(|count| {
                warn!("TransportDriver delivery of {filename} failed {count} times: {err}");
            });
            if failures >= self.max_failure {
                warn!("TransportDriver abandoning {filename} after {failures} failures: {err}");
                return Err(err);
            }
            let Some(delay) = self.backoff.next_sleep(now) else {
                warn!("TransportDriver retry deadline passed for {filename}: {err}");
                return Err(err);
            };
            thread::sleep(delay);
            reconnect_first = true;
        }
    }

    /// Release the transport's sink.
    pub fn shutdown(&mut self) -> bool {
        self.warner.flush(|count| {
            warn!("TransportDriver shutting down with {count} unreported failures");
        });
        self.transport.interrupt()
    }

    pub fn into_inner(self) -> Box<T> {
        self.transport
    }
}

impl<T: FemtoTransport + ?Sized> std::fmt::Debug for TransportDriver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportDriver")
            .field("max_failure", &self.max_failure)
            .field("backoff", &self.backoff)
            .field("valid", &self.transport.is_valid())
            .finish()
    }
}
