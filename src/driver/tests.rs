//! Tests for the retry driver.

use std::{any::Any, collections::VecDeque, io, time::Duration};

use rstest::{fixture, rstest};

use crate::{
    config::{ConfigError, FileConfig, TransportConfig},
    transport::{FemtoTransport, TransportBuildError, TransportCore, TransportError},
};

use super::{BackoffPolicy, DriverConfig, TransportDriver};

#[derive(Clone, Copy, Debug)]
enum Step {
    Ok,
    Sink,
    Fatal,
    Closed,
}

impl Step {
    fn into_result(self) -> Result<(), TransportError> {
        match self {
            Step::Ok => Ok(()),
            Step::Sink => Err(TransportError::Sink(io::Error::other("connection dropped"))),
            Step::Fatal => Err(TransportError::Fatal(io::Error::other("protocol violation"))),
            Step::Closed => Err(TransportError::Closed),
        }
    }
}

/// Transport replaying scripted outcomes and recording each call.
struct ScriptedTransport {
    core: TransportCore,
    sends: VecDeque<Step>,
    reconnects: VecDeque<bool>,
    timestamps: Vec<String>,
    reconnect_calls: usize,
    unhandled_calls: usize,
    interrupt_calls: usize,
}

impl ScriptedTransport {
    fn new(sends: &[Step]) -> Self {
        let config = TransportConfig::new("scripted").with_hostname("h");
        Self {
            core: TransportCore::new(&config, FileConfig::new().shared()).expect("valid config"),
            sends: sends.iter().copied().collect(),
            reconnects: VecDeque::new(),
            timestamps: Vec::new(),
            reconnect_calls: 0,
            unhandled_calls: 0,
            interrupt_calls: 0,
        }
    }

    fn with_reconnects(mut self, outcomes: &[bool]) -> Self {
        self.reconnects = outcomes.iter().copied().collect();
        self
    }
}

impl FemtoTransport for ScriptedTransport {
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
        timestamp: Option<&str>,
    ) -> Result<(), TransportError> {
        self.timestamps
            .push(timestamp.map(str::to_owned).unwrap_or_default());
        let step = self.sends.pop_front().unwrap_or(Step::Ok);
        if matches!(step, Step::Fatal) {
            self.core.invalidate();
        }
        step.into_result()
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.reconnect_calls += 1;
        if self.reconnects.pop_front().unwrap_or(true) {
            Ok(())
        } else {
            Err(TransportError::Reconnect(TransportBuildError::Io(
                io::Error::other("refused"),
            )))
        }
    }

    fn unhandled(&mut self) -> bool {
        self.unhandled_calls += 1;
        true
    }

    fn interrupt(&mut self) -> bool {
        self.interrupt_calls += 1;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[fixture]
fn fast_config() -> DriverConfig {
    DriverConfig::default()
        .with_max_failure(4)
        .with_backoff(BackoffPolicy {
            base: Duration::from_millis(1),
            cap: Duration::from_millis(1),
            reset_after: Duration::from_millis(50),
            deadline: Duration::from_secs(5),
        })
}

fn driver(sends: &[Step], config: DriverConfig) -> TransportDriver<ScriptedTransport> {
    TransportDriver::new(Box::new(ScriptedTransport::new(sends)), config)
}

fn batch() -> Vec<String> {
    vec!["one".to_owned(), "two".to_owned()]
}

#[rstest]
fn success_needs_no_retry(fast_config: DriverConfig) {
    let mut driver = driver(&[Step::Ok], fast_config);
    driver.ship("/x.log", &batch()).expect("delivered");
    assert_eq!(driver.transport().timestamps.len(), 1);
    assert_eq!(driver.transport().reconnect_calls, 0);
}

#[rstest]
fn recoverable_failures_reconnect_and_resend(fast_config: DriverConfig) {
    let mut driver = driver(&[Step::Sink, Step::Sink, Step::Ok], fast_config);
    driver.ship("/x.log", &batch()).expect("delivered on third attempt");

    let transport = driver.transport();
    assert_eq!(transport.timestamps.len(), 3);
    assert_eq!(transport.reconnect_calls, 2);
    assert!(
        transport
            .timestamps
            .iter()
            .all(|ts| ts == &transport.timestamps[0]),
        "retries reuse the batch timestamp"
    );
    assert!(transport.timestamps[0].ends_with('Z'));
}

#[rstest]
fn gives_up_after_max_failure(fast_config: DriverConfig) {
    let mut driver = driver(&[Step::Sink; 10], fast_config);
    let err = driver.ship("/x.log", &batch()).expect_err("must give up");
    assert!(matches!(err, TransportError::Sink(_)));
    assert_eq!(driver.transport().timestamps.len(), 4);
    assert_eq!(driver.transport().reconnect_calls, 3);
    assert_eq!(driver.transport().unhandled_calls, 0);
}

#[rstest]
fn failed_reconnect_counts_as_failure(fast_config: DriverConfig) {
    let transport = ScriptedTransport::new(&[Step::Sink, Step::Ok]).with_reconnects(&[false, true]);
    let mut driver = TransportDriver::new(Box::new(transport), fast_config);
    driver.ship("/x.log", &batch()).expect("delivered after second reconnect");
    assert_eq!(driver.transport().reconnect_calls, 2);
    assert_eq!(driver.transport().timestamps.len(), 2);
}

#[rstest]
#[case(Step::Fatal)]
#[case(Step::Closed)]
fn unrecoverable_errors_call_unhandled(fast_config: DriverConfig, #[case] step: Step) {
    let mut driver = driver(&[step], fast_config);
    let err = driver.ship("/x.log", &batch()).expect_err("must fail");
    assert!(!err.is_recoverable());
    assert_eq!(driver.transport().unhandled_calls, 1);
    assert_eq!(driver.transport().reconnect_calls, 0);
}

#[rstest]
fn invalid_transport_is_not_driven(fast_config: DriverConfig) {
    let mut driver = driver(&[Step::Fatal], fast_config);
    assert!(driver.ship("/x.log", &batch()).is_err());
    assert!(!driver.transport().is_valid());

    let err = driver.ship("/x.log", &batch()).expect_err("invalid transport");
    assert!(matches!(err, TransportError::Invalid));
    assert_eq!(driver.transport().timestamps.len(), 1);
}

#[rstest]
fn deadline_stops_retries() {
    let config = DriverConfig::default()
        .with_max_failure(1_000)
        .with_backoff(BackoffPolicy {
            base: Duration::from_millis(5),
            cap: Duration::from_millis(5),
            reset_after: Duration::from_millis(50),
            deadline: Duration::from_millis(30),
        });
    let mut driver = driver(&[Step::Sink; 1_000], config);
    let err = driver.ship("/x.log", &batch()).expect_err("deadline passes");
    assert!(err.is_recoverable());
    assert!(driver.transport().timestamps.len() < 1_000);
}

#[rstest]
fn shutdown_interrupts_transport(fast_config: DriverConfig) {
    let mut driver = driver(&[], fast_config);
    assert!(driver.shutdown());
    assert_eq!(driver.into_inner().interrupt_calls, 1);
}

#[rstest]
fn boxed_dyn_transport_is_supported(fast_config: DriverConfig) {
    let transport: Box<dyn FemtoTransport> = Box::new(ScriptedTransport::new(&[Step::Sink]));
    let mut driver: TransportDriver = TransportDriver::new(transport, fast_config);
    driver.ship("/x.log", &batch()).expect("delivered after retry");
    assert!(driver.transport().as_any().is::<ScriptedTransport>());
}

#[rstest]
fn driver_config_errors_surface_as_config_errors() {
    let transport = TransportConfig::new("zmq").with_setting("max_failure", "0");
    assert!(matches!(
        DriverConfig::from_transport_config(&transport),
        Err(ConfigError::InvalidValue { .. })
    ));
}
