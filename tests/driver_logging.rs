//! Logging behaviour of the retry driver.
//!
//! Lives in its own test binary because `logtest` installs the global logger
//! once per process.

use std::{any::Any, io, time::Duration};

use femtoship::{
    BackoffPolicy, DriverConfig, FemtoTransport, FileConfig, TransportConfig, TransportCore,
    TransportDriver, TransportError,
};
use logtest::Logger;
use rstest::rstest;

/// Transport failing a fixed number of sends before succeeding.
struct FlakyTransport {
    core: TransportCore,
    failures_left: usize,
}

impl FemtoTransport for FlakyTransport {
    fn core(&self) -> &TransportCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TransportCore {
        &mut self.core
    }

    fn callback_at(
        &mut self,
        _filename: &str,
        _lines: &[String],
        _timestamp: Option<&str>,
    ) -> Result<(), TransportError> {
        if self.failures_left == 0 {
            return Ok(());
        }
        self.failures_left -= 1;
        Err(TransportError::Sink(io::Error::other("connection dropped")))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[rstest]
fn failures_are_logged() {
    let mut logger = Logger::start();
    let config = TransportConfig::new("flaky").with_hostname("h");
    let transport = FlakyTransport {
        core: TransportCore::new(&config, FileConfig::new().shared()).expect("valid config"),
        failures_left: 1,
    };
    let driver_config = DriverConfig::default().with_backoff(BackoffPolicy {
        base: Duration::from_millis(1),
        cap: Duration::from_millis(1),
        reset_after: Duration::from_millis(50),
        deadline: Duration::from_secs(5),
    });
    let mut driver = TransportDriver::new(Box::new(transport), driver_config);
    driver
        .ship("/var/log/flaky.log", &["line".to_owned()])
        .expect("delivered after retry");

    let record = std::iter::from_fn(|| logger.pop())
        .find(|record| record.args().contains("/var/log/flaky.log"))
        .expect("failure warning emitted");
    assert_eq!(record.level(), log::Level::Warn);
    assert!(record.args().contains("connection dropped"));
}
