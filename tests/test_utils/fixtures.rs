//! Fixtures providing `(SharedBuf, StdoutTransport)` pairs so transports can
//! be exercised without a terminal or a network peer.

use femtoship::{
    FileConfig, FileSettings, SharedFileConfig, StdoutTransport, TransportConfig, TransportCore,
};
use rstest::fixture;

use super::shared_buffer::SharedBuf;

/// File configuration with one exact entry and one glob entry.
#[fixture]
pub fn file_config() -> SharedFileConfig {
    FileConfig::new()
        .with_entry(
            "/var/log/nginx/access.log",
            FileSettings::default()
                .with_event_type("nginx")
                .with_tags(["web", "edge"])
                .with_field("dc", "ams1"),
        )
        .with_entry(
            "/var/log/app/*.log",
            FileSettings::default()
                .with_event_type("app")
                .with_message_format("rawjson"),
        )
        .shared()
}

/// Return a stdout transport writing to a fresh buffer.
#[fixture]
#[allow(dead_code)]
pub fn captured(
    file_config: SharedFileConfig,
    #[default("json")] format: &str,
) -> (SharedBuf, StdoutTransport) {
    let config = TransportConfig::new("stdout")
        .with_hostname("web-1")
        .with_format(format);
    let core = TransportCore::new(&config, file_config).expect("valid transport config");
    let buffer = SharedBuf::default();
    let transport = StdoutTransport::with_writer(core, buffer.clone());
    (buffer, transport)
}
