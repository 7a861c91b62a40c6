//! Invocation of the external automation executable.
//!
//! [`AutomationBackend`] is the only platform-bound piece of the server.
//! [`ProcessBackend`] runs a real subprocess; tests substitute their own
//! implementation.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::automation::Operation;
use crate::config::AutomationConfig;
use crate::error::{BridgeError, BridgeResult};

/// Captured result of one run of the automation executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` if the command exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs the automation executable.
#[async_trait]
pub trait AutomationBackend: Send + Sync {
    /// Runs `operation` with positional string arguments and waits for it
    /// to finish.
    ///
    /// A non-zero exit is reported through [`CommandOutput::code`], not as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable is missing, cannot be started,
    /// or exceeds its time limit.
    async fn invoke(&self, operation: Operation, args: &[String]) -> BridgeResult<CommandOutput>;
}

/// Runs the automation executable as a child process.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
    base_args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessBackend {
    /// Creates a backend that runs `program base_args... <subcommand> <args...>`.
    #[must_use]
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            working_dir: None,
            timeout: None,
        }
    }

    /// Creates a backend from configuration.
    #[must_use]
    pub fn from_config(config: &AutomationConfig) -> Self {
        Self {
            program: config.program.clone(),
            base_args: config.args.clone(),
            working_dir: config.working_dir.clone(),
            timeout: config.timeout(),
        }
    }

    /// Sets the working directory of the child process.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Limits how long a single invocation may run.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn command(&self, operation: Operation, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg(operation.subcommand())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd
    }

    fn launch_error(&self, source: io::Error) -> BridgeError {
        if source.kind() == io::ErrorKind::NotFound {
            BridgeError::ExecutableNotFound {
                program: self.program.clone(),
            }
        } else {
            BridgeError::Spawn {
                program: self.program.clone(),
                source,
            }
        }
    }
}

#[async_trait]
impl AutomationBackend for ProcessBackend {
    async fn invoke(&self, operation: Operation, args: &[String]) -> BridgeResult<CommandOutput> {
        tracing::debug!(
            program = %self.program,
            subcommand = operation.subcommand(),
            args = ?args,
            "Invoking automation executable"
        );

        let mut cmd = self.command(operation, args);
        let output = cmd.output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                tracing::warn!(%operation, seconds = limit.as_secs(), "Automation command timed out");
                BridgeError::Timeout {
                    operation,
                    seconds: limit.as_secs(),
                }
            })?,
            None => output.await,
        }
        .map_err(|e| self.launch_error(e))?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(%operation, code = ?result.code, "Automation executable finished");

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_output_success() {
        let ok = CommandOutput {
            code: Some(0),
            ..CommandOutput::default()
        };
        let failed = CommandOutput {
            code: Some(1),
            ..CommandOutput::default()
        };
        let killed = CommandOutput::default();

        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[test]
    fn from_config_copies_settings() {
        let config = AutomationConfig {
            program: "guidant".to_string(),
            args: vec!["--quiet".to_string()],
            working_dir: Some(PathBuf::from("/opt")),
            timeout_secs: Some(3),
        };
        let backend = ProcessBackend::from_config(&config);
        assert_eq!(backend.program, "guidant");
        assert_eq!(backend.base_args, vec!["--quiet"]);
        assert_eq!(backend.working_dir, Some(PathBuf::from("/opt")));
        assert_eq!(backend.timeout, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn missing_executable_is_reported() {
        let backend = ProcessBackend::new("guidant-mcp-no-such-program-7c1f", Vec::new());
        let err = backend
            .invoke(Operation::Click, &["1".to_string(), "2".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ExecutableNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_exit_status_and_stderr() {
        let backend = ProcessBackend::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo \"ran $0 $1\"; echo oops >&2; exit 3".to_string(),
            ],
        );
        let output = backend
            .invoke(Operation::Screenshot, &["/tmp/x.png".to_string()])
            .await
            .unwrap();

        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "ran screenshot /tmp/x.png");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_in_configured_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ProcessBackend::new("sh", vec!["-c".to_string(), "pwd".to_string()])
            .with_working_dir(dir.path());
        let output = backend.invoke(Operation::Screenshot, &[]).await.unwrap();

        assert!(output.success());
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let backend = ProcessBackend::new("sh", vec!["-c".to_string(), "sleep 5".to_string()])
            .with_timeout(Duration::from_millis(100));
        let err = backend.invoke(Operation::Click, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Timeout {
                operation: Operation::Click,
                ..
            }
        ));
    }
}
