//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Automation executable settings.
    #[serde(default)]
    pub automation: AutomationConfig,

    /// Screenshot output settings.
    #[serde(default)]
    pub screenshot: ScreenshotConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.automation.program.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "automation.program cannot be empty".to_string(),
            });
        }

        if self.automation.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError {
                message: "automation.timeout_secs must be greater than zero".to_string(),
            });
        }

        let file_name = self.screenshot.file_name.trim();
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid screenshot.file_name '{}'. Must be a bare file name",
                    self.screenshot.file_name
                ),
            });
        }

        if self.http.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid http.bind '{}'. Expected HOST:PORT",
                    self.http.bind
                ),
            });
        }

        Ok(())
    }
}

/// Settings for the external automation executable.
///
/// The command line is `program args... <subcommand> <positional...>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationConfig {
    /// Program to execute.
    /// Default: "xcrun"
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the subcommand.
    /// Default: ["swift", "main.swift"]
    #[serde(default = "default_program_args")]
    pub args: Vec<String>,

    /// Working directory for the executable (inherits ours when unset).
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Maximum run time per invocation. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl AutomationConfig {
    /// Returns the configured timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_program_args(),
            working_dir: None,
            timeout_secs: None,
        }
    }
}

fn default_program() -> String {
    "xcrun".to_string()
}

fn default_program_args() -> Vec<String> {
    vec!["swift".to_string(), "main.swift".to_string()]
}

/// Where screenshots are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenshotConfig {
    /// Output directory. Relative paths resolve against the process
    /// working directory; unset means the working directory itself.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// File name reused on every call when `unique` is false.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Write each screenshot to its own `screenshot-<uuid>.png`.
    #[serde(default)]
    pub unique: bool,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_name: default_file_name(),
            unique: false,
        }
    }
}

fn default_file_name() -> String {
    "screenshot.png".to_string()
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Address the HTTP transport listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5001".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.automation.program, "xcrun");
        assert_eq!(config.screenshot.file_name, "screenshot.png");
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "automation": {
                "program": "/usr/local/bin/guidant",
                "args": [],
                "working_dir": "/opt/guidant",
                "timeout_secs": 30
            },
            "screenshot": {
                "dir": "/tmp/shots",
                "file_name": "screen.png",
                "unique": true
            },
            "http": {
                "bind": "0.0.0.0:8080"
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.automation.program, "/usr/local/bin/guidant");
        assert!(config.automation.args.is_empty());
        assert_eq!(
            config.automation.working_dir,
            Some(PathBuf::from("/opt/guidant"))
        );
        assert_eq!(config.automation.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.screenshot.dir, Some(PathBuf::from("/tmp/shots")));
        assert!(config.screenshot.unique);
        assert_eq!(config.http.bind, "0.0.0.0:8080");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn automation_config_defaults() {
        let config = AutomationConfig::default();
        assert_eq!(config.program, "xcrun");
        assert_eq!(config.args, vec!["swift", "main.swift"]);
        assert!(config.working_dir.is_none());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn screenshot_config_defaults() {
        let config = ScreenshotConfig::default();
        assert!(config.dir.is_none());
        assert_eq!(config.file_name, "screenshot.png");
        assert!(!config.unique);
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn reject_zero_timeout() {
        let json = r#"{ "automation": { "timeout_secs": 0 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_empty_program() {
        let json = r#"{ "automation": { "program": "  " } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_file_name_with_separator() {
        let json = r#"{ "screenshot": { "file_name": "../escape.png" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_bad_bind_address() {
        let json = r#"{ "http": { "bind": "localhost" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
