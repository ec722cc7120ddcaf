//! Configuration file support
//!
//! Optional TOML file supplying defaults for the global options. Command
//! line flags take precedence over anything set here.
//!
//! ```toml
//! [output]
//! timestamp = true
//!
//! [logging]
//! level = "info"
//!
//! [netlink]
//! receive_buffer_bytes = 1048576
//! ```

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Output presentation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Prefix every record with the wall-clock capture time
    #[serde(default)]
    pub timestamp: bool,
}

/// Diagnostic logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Live socket settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetlinkConfig {
    /// SO_RCVBUF for the live socket; 0 keeps the kernel default
    #[serde(default = "default_receive_buffer")]
    pub receive_buffer_bytes: usize,
}

/// Complete bridge-monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub netlink: NetlinkConfig,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_receive_buffer() -> usize {
    1024 * 1024
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for NetlinkConfig {
    fn default() -> Self {
        Self {
            receive_buffer_bytes: default_receive_buffer(),
        }
    }
}

impl MonitorSettings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            MonitorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
            .map_err(|e| MonitorError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse settings from TOML text
    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = MonitorSettings::default();
        assert!(!settings.output.timestamp);
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.netlink.receive_buffer_bytes, 1024 * 1024);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(
            MonitorSettings::parse("").unwrap(),
            MonitorSettings::default()
        );
    }

    #[test]
    fn test_partial_sections() {
        let settings = MonitorSettings::parse(
            r#"
            [output]
            timestamp = true

            [netlink]
            receive_buffer_bytes = 0
            "#,
        )
        .unwrap();
        assert!(settings.output.timestamp);
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.netlink.receive_buffer_bytes, 0);
    }

    #[test]
    fn test_bad_type_rejected() {
        assert!(MonitorSettings::parse("[output]\ntimestamp = \"yes\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();
        let settings = MonitorSettings::load(file.path()).unwrap();
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MonitorSettings::load(&dir.path().join("none.toml")).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }
}
