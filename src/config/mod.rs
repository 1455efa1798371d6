//! Configuration consumed by the transport resolver and transports.

mod file;
pub mod ini;
mod types;

pub use file::{FileConfig, FileSettings, SharedFileConfig};
pub use ini::{load_ini_file, parse_ini_str};
pub use types::{ConfigError, FormatterFallback, TransportConfig};
