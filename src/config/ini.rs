//! INI configuration loader.
//!
//! The `[agent]` section carries the global transport settings; every other
//! section names a file path or glob and carries that file's settings:
//!
//! ```ini
//! [agent]
//! transport = zmq
//! format = json
//! zeromq_address = tcp://collector:2120
//!
//! [/var/log/nginx/*.log]
//! type = nginx
//! tags = web,edge
//! fields = dc,eu-1,team,platform
//! ```

use std::{fs, path::Path};

use encoding_rs::{Encoding, UTF_8};
use ini::Ini;

use super::{ConfigError, FileConfig, FileSettings, TransportConfig};

/// Name of the section holding the global settings.
pub const AGENT_SECTION: &str = "agent";

/// Read, decode and parse an INI file.
///
/// `encoding` is an `encoding_rs` label; UTF-8 is used when it is `None`.
pub fn load_ini_file(
    path: impl AsRef<Path>,
    encoding: Option<&str>,
) -> Result<(TransportConfig, FileConfig), ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let bytes = read_file_bytes(path, &display)?;
    if bytes.is_empty() {
        return Err(ConfigError::EmptyFile(display));
    }
    let text = decode_with_encoding(&bytes, encoding, &display)?;
    parse_ini_str(&text)
}

/// Parse INI text into the global and per-file configuration.
pub fn parse_ini_str(text: &str) -> Result<(TransportConfig, FileConfig), ConfigError> {
    let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;

    let agent = ini
        .section(Some(AGENT_SECTION))
        .ok_or(ConfigError::MissingKey("[agent]"))?;
    let transport = agent
        .get("transport")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingKey("transport"))?;

    let mut config = TransportConfig::new(transport);
    for (key, value) in agent.iter() {
        if key != "transport" {
            config.apply(key, value.trim())?;
        }
    }

    let mut files = FileConfig::new();
    for (section, properties) in ini.iter() {
        let Some(section) = section.filter(|name| *name != AGENT_SECTION) else {
            continue;
        };
        let mut settings = FileSettings::default();
        for (key, value) in properties.iter() {
            apply_file_key(&mut settings, section, key, value.trim())?;
        }
        files.insert(section, settings);
    }
    Ok((config, files))
}

fn apply_file_key(
    settings: &mut FileSettings,
    section: &str,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    match key {
        "message_format" => settings.message_format = Some(value.to_owned()),
        "type" => settings.event_type = Some(value.to_owned()),
        "tags" => settings.tags = split_list(value).map(str::to_owned).collect(),
        "fields" => {
            let items: Vec<&str> = split_list(value).collect();
            if items.len() % 2 != 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("{section}.fields"),
                    value: value.to_owned(),
                });
            }
            for pair in items.chunks_exact(2) {
                settings
                    .fields
                    .insert(pair[0].to_owned(), pair[1].to_owned());
            }
        }
        _ => log::debug!("ignoring unknown key {key} in section [{section}]"),
    }
    Ok(())
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn read_file_bytes(path: &Path, display: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|source| ConfigError::Io {
        path: display.to_owned(),
        source,
    })
}

fn decode_with_encoding(
    bytes: &[u8],
    label: Option<&str>,
    display: &str,
) -> Result<String, ConfigError> {
    let encoding = match label {
        Some(label) => {
            let normalized = label.trim().to_ascii_lowercase();
            Encoding::for_label(normalized.as_bytes())
                .ok_or_else(|| ConfigError::UnknownEncoding(label.to_owned()))?
        }
        None => UTF_8,
    };
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ConfigError::Decode {
            path: display.to_owned(),
            encoding: encoding.name().to_owned(),
        });
    }
    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatterFallback;
    use rstest::rstest;
    use std::io::{ErrorKind, Write};
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
[agent]
transport = zmq
hostname = web-1
format = json
formatter_fallback = warn
zeromq_address = tcp://collector:2120
mode = bind

[/var/log/app.log]
message_format = rawjson
type = app

[/var/log/nginx/*.log]
type = nginx
tags = web, edge
fields = dc,eu-1,team,platform
";

    #[test]
    fn parses_agent_and_file_sections() {
        let (config, files) = parse_ini_str(SAMPLE).expect("parse sample");
        assert_eq!(config.transport(), "zmq");
        assert_eq!(config.hostname(), "web-1");
        assert_eq!(config.format(), "json");
        assert_eq!(config.formatter_fallback(), FormatterFallback::Warn);
        assert_eq!(config.setting("zeromq_address"), Some("tcp://collector:2120"));
        assert_eq!(config.setting("mode"), Some("bind"));

        assert_eq!(files.message_format("/var/log/app.log"), Some("rawjson"));
        assert_eq!(files.event_type("/var/log/app.log"), Some("app"));
        let keys: Vec<_> = files.keys().collect();
        assert_eq!(keys, vec!["/var/log/app.log", "/var/log/nginx/*.log"]);
        let nginx = files.settings("/var/log/nginx/*.log");
        assert_eq!(nginx.tags, vec!["web".to_owned(), "edge".to_owned()]);
        assert_eq!(nginx.fields.len(), 2);
        assert_eq!(nginx.fields.get("team").map(String::as_str), Some("platform"));
    }

    #[rstest]
    #[case("[/var/log/a.log]\ntype = a\n", "[agent]")]
    #[case("[agent]\nformat = json\n", "transport")]
    #[case("[agent]\ntransport =   \n", "transport")]
    fn missing_required_keys_are_rejected(#[case] text: &str, #[case] key: &str) {
        let err = parse_ini_str(text).expect_err("must fail");
        assert!(matches!(err, ConfigError::MissingKey(k) if k == key));
    }

    #[test]
    fn odd_field_list_is_rejected() {
        let err = parse_ini_str("[agent]\ntransport = stdout\n[/a.log]\nfields = a,b,c\n")
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "/a.log.fields"));
    }

    #[test]
    fn invalid_fallback_is_rejected() {
        let err = parse_ini_str("[agent]\ntransport = stdout\nformatter_fallback = loud\n")
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "formatter_fallback"));
    }

    #[test]
    fn loads_file_with_explicit_encoding() {
        let mut file = NamedTempFile::new().expect("temp file");
        let (encoded, _, _) = encoding_rs::WINDOWS_1252
            .encode("[agent]\ntransport = stdout\nhostname = caf\u{e9}\n");
        file.write_all(&encoded).expect("write config");

        let (config, _) =
            load_ini_file(file.path(), Some("windows-1252")).expect("load config");
        assert_eq!(config.hostname(), "caf\u{e9}");
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"[agent]\ntransport = \xff\xfe\n").expect("write config");
        let err = load_ini_file(file.path(), None).expect_err("must fail");
        assert!(matches!(err, ConfigError::Decode { encoding, .. } if encoding == "UTF-8"));
    }

    #[test]
    fn unknown_encoding_is_reported() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"[agent]\ntransport = stdout\n").expect("write config");
        let err = load_ini_file(file.path(), Some("klingon")).expect_err("must fail");
        assert!(matches!(err, ConfigError::UnknownEncoding(label) if label == "klingon"));
    }

    #[test]
    fn empty_and_missing_files_are_reported() {
        let file = NamedTempFile::new().expect("temp file");
        let err = load_ini_file(file.path(), None).expect_err("empty must fail");
        assert!(matches!(err, ConfigError::EmptyFile(_)));

        let dir = tempfile::tempdir().expect("temp dir");
        let err =
            load_ini_file(dir.path().join("absent.ini"), None).expect_err("missing must fail");
        assert!(matches!(err, ConfigError::Io { source, .. } if source.kind() == ErrorKind::NotFound));
    }
}
