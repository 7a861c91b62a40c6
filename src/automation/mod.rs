//! Desktop automation: screenshots and mouse clicks.
//!
//! The [`Automation`] executor validates arguments, allocates the screenshot
//! output path, hands the actual work to an [`AutomationBackend`], and turns
//! the backend's exit status and output into an [`OperationOutcome`] or a
//! [`BridgeError`].
//!
//! # External Command Contract
//!
//! ```text
//! <program> [args...] screenshot <destination-path>
//! <program> [args...] click <x> <y>
//! ```
//!
//! A zero exit status means success. Standard error is surfaced as error
//! detail on failure.

pub mod backend;

pub use backend::{AutomationBackend, CommandOutput, ProcessBackend};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::config::ScreenshotConfig;
use crate::error::{BridgeError, BridgeResult};

/// MIME type of captured screenshots.
pub const SCREENSHOT_MIME_TYPE: &str = "image/png";

/// The two desktop operations the automation executable performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Capture the main display.
    Screenshot,
    /// Left-click at a screen position.
    Click,
}

impl Operation {
    /// Subcommand passed to the automation executable.
    #[must_use]
    pub const fn subcommand(self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::Click => "click",
        }
    }

    /// Message reported when the executable exits with a failure status.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Screenshot => "Failed to take screenshot",
            Self::Click => "Failed to perform click",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.subcommand())
    }
}

/// Result of a successful operation.
///
/// Failures never produce an outcome; they are reported as [`BridgeError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    /// Always `true` for a returned outcome.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Where the screenshot was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64-encoded image data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// MIME type of `image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Trimmed standard output of the automation executable, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl OperationOutcome {
    fn new(message: impl Into<String>, output: &CommandOutput) -> Self {
        let stdout = output.stdout.trim();
        Self {
            success: true,
            message: message.into(),
            path: None,
            image: None,
            mime_type: None,
            output: (!stdout.is_empty()).then(|| stdout.to_string()),
        }
    }
}

/// Click target read from request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    /// Horizontal position.
    pub x: Number,
    /// Vertical position.
    pub y: Number,
}

impl Coordinates {
    /// Reads `x` and `y` from a parameters object.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MissingCoordinates`] if either is absent or
    /// `null`, and [`BridgeError::InvalidCoordinates`] if either is not a
    /// number.
    pub fn from_params(params: &Value) -> BridgeResult<Self> {
        let x = params.get("x").filter(|v| !v.is_null());
        let y = params.get("y").filter(|v| !v.is_null());

        let (Some(x), Some(y)) = (x, y) else {
            return Err(BridgeError::MissingCoordinates);
        };

        match (x, y) {
            (Value::Number(x), Value::Number(y)) => Ok(Self {
                x: x.clone(),
                y: y.clone(),
            }),
            _ => Err(BridgeError::InvalidCoordinates),
        }
    }

    fn to_args(&self) -> Vec<String> {
        vec![self.x.to_string(), self.y.to_string()]
    }
}

/// Performs screenshots and clicks through an [`AutomationBackend`].
#[derive(Clone)]
pub struct Automation {
    backend: Arc<dyn AutomationBackend>,
    screenshot_dir: PathBuf,
    file_name: String,
    unique_paths: bool,
}

impl std::fmt::Debug for Automation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Automation")
            .field("screenshot_dir", &self.screenshot_dir)
            .field("file_name", &self.file_name)
            .field("unique_paths", &self.unique_paths)
            .finish_non_exhaustive()
    }
}

impl Automation {
    /// Creates an executor writing `screenshot.png` into `screenshot_dir`.
    #[must_use]
    pub fn new(backend: Arc<dyn AutomationBackend>, screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            screenshot_dir: screenshot_dir.into(),
            file_name: "screenshot.png".to_string(),
            unique_paths: false,
        }
    }

    /// Creates an executor from screenshot settings.
    ///
    /// A relative or missing `dir` is resolved against `base_dir`.
    #[must_use]
    pub fn from_config(
        backend: Arc<dyn AutomationBackend>,
        config: &ScreenshotConfig,
        base_dir: &Path,
    ) -> Self {
        let dir = config
            .dir
            .as_ref()
            .map_or_else(|| base_dir.to_path_buf(), |d| base_dir.join(d));

        Self {
            backend,
            screenshot_dir: dir,
            file_name: config.file_name.clone(),
            unique_paths: config.unique,
        }
    }

    /// Writes every screenshot to its own uniquely named file.
    #[must_use]
    pub const fn with_unique_paths(mut self, unique: bool) -> Self {
        self.unique_paths = unique;
        self
    }

    /// Returns the path the next screenshot will be written to.
    #[must_use]
    pub fn screenshot_path(&self) -> PathBuf {
        if self.unique_paths {
            self.screenshot_dir
                .join(format!("screenshot-{}.png", uuid::Uuid::new_v4()))
        } else {
            self.screenshot_dir.join(&self.file_name)
        }
    }

    /// Runs `operation` with the given request parameters.
    ///
    /// # Errors
    ///
    /// See [`Self::screenshot`] and [`Self::click`].
    pub async fn run(&self, operation: Operation, params: &Value) -> BridgeResult<OperationOutcome> {
        match operation {
            Operation::Screenshot => self.screenshot().await,
            Operation::Click => self.click(params).await,
        }
    }

    /// Captures the screen and returns the image as base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable is missing, exits non-zero, or the
    /// image cannot be read afterwards.
    pub async fn screenshot(&self) -> BridgeResult<OperationOutcome> {
        let path = self.screenshot_path();
        let path_str = path.to_string_lossy().into_owned();

        let output = self
            .backend
            .invoke(Operation::Screenshot, std::slice::from_ref(&path_str))
            .await?;
        Self::check_status(Operation::Screenshot, &output)?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| BridgeError::ImageRead {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Screenshot taken");

        let mut outcome = OperationOutcome::new("Screenshot taken successfully", &output);
        outcome.path = Some(path_str);
        outcome.image = Some(BASE64_STANDARD.encode(&bytes));
        outcome.mime_type = Some(SCREENSHOT_MIME_TYPE.to_string());
        Ok(outcome)
    }

    /// Clicks at the `x`/`y` coordinates in `params`.
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate is missing or not a number (the
    /// executable is not started in that case), if the executable is
    /// missing, or if it exits non-zero.
    pub async fn click(&self, params: &Value) -> BridgeResult<OperationOutcome> {
        let target = Coordinates::from_params(params)?;

        let output = self
            .backend
            .invoke(Operation::Click, &target.to_args())
            .await?;
        Self::check_status(Operation::Click, &output)?;

        tracing::info!(x = %target.x, y = %target.y, "Click performed");

        Ok(OperationOutcome::new(
            format!("Clicked at ({}, {})", target.x, target.y),
            &output,
        ))
    }

    fn check_status(operation: Operation, output: &CommandOutput) -> BridgeResult<()> {
        if output.success() {
            return Ok(());
        }

        tracing::warn!(
            %operation,
            code = ?output.code,
            stderr = %output.stderr.trim(),
            "Automation command failed"
        );

        Err(BridgeError::CommandFailed {
            operation,
            stderr: output.stderr.clone(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeBackend, FAKE_PNG};
    use super::*;
    use serde_json::json;

    fn automation(backend: &Arc<FakeBackend>, dir: &Path) -> Automation {
        Automation::new(Arc::clone(backend) as Arc<dyn AutomationBackend>, dir)
    }

    #[test]
    fn coordinates_require_both() {
        assert!(matches!(
            Coordinates::from_params(&json!({"x": 100})),
            Err(BridgeError::MissingCoordinates)
        ));
        assert!(matches!(
            Coordinates::from_params(&json!({"y": 5, "x": null})),
            Err(BridgeError::MissingCoordinates)
        ));
        assert!(matches!(
            Coordinates::from_params(&json!({})),
            Err(BridgeError::MissingCoordinates)
        ));
    }

    #[test]
    fn coordinates_must_be_numbers() {
        assert!(matches!(
            Coordinates::from_params(&json!({"x": "left", "y": 5})),
            Err(BridgeError::InvalidCoordinates)
        ));
    }

    #[test]
    fn coordinates_keep_number_formatting() {
        let c = Coordinates::from_params(&json!({"x": 100, "y": 20.5})).unwrap();
        assert_eq!(c.to_args(), vec!["100", "20.5"]);
    }

    #[test]
    fn fixed_screenshot_path_is_reused() {
        let backend = Arc::new(FakeBackend::default());
        let automation = automation(&backend, Path::new("/work"));
        assert_eq!(
            automation.screenshot_path(),
            PathBuf::from("/work/screenshot.png")
        );
        assert_eq!(automation.screenshot_path(), automation.screenshot_path());
    }

    #[test]
    fn unique_screenshot_paths_differ() {
        let backend = Arc::new(FakeBackend::default());
        let automation = automation(&backend, Path::new("/work")).with_unique_paths(true);
        let a = automation.screenshot_path();
        let b = automation.screenshot_path();
        assert_ne!(a, b);
        assert!(a.starts_with("/work"));
    }

    #[test]
    fn from_config_resolves_relative_dir() {
        let backend: Arc<dyn AutomationBackend> = Arc::new(FakeBackend::default());
        let config = ScreenshotConfig {
            dir: Some(PathBuf::from("shots")),
            file_name: "screen.png".to_string(),
            unique: false,
        };
        let automation = Automation::from_config(backend, &config, Path::new("/base"));
        assert_eq!(
            automation.screenshot_path(),
            PathBuf::from("/base/shots/screen.png")
        );
    }

    #[tokio::test]
    async fn screenshot_encodes_image() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let outcome = automation(&backend, dir.path()).screenshot().await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.message, "Screenshot taken successfully");
        assert_eq!(outcome.image, Some(BASE64_STANDARD.encode(FAKE_PNG)));
        assert_eq!(outcome.mime_type.as_deref(), Some(SCREENSHOT_MIME_TYPE));
        assert!(outcome.output.is_none());

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Operation::Screenshot);
        assert_eq!(Some(&calls[0].1[0]), outcome.path.as_ref());
    }

    #[tokio::test]
    async fn screenshot_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::failing("no display"));
        let err = automation(&backend, dir.path())
            .screenshot()
            .await
            .unwrap_err();

        match err {
            BridgeError::CommandFailed { operation, stderr } => {
                assert_eq!(operation, Operation::Screenshot);
                assert_eq!(stderr, "no display");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn screenshot_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend {
            skip_write: true,
            ..FakeBackend::default()
        });
        let err = automation(&backend, dir.path())
            .screenshot()
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ImageRead { .. }));
    }

    #[tokio::test]
    async fn click_passes_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let outcome = automation(&backend, dir.path())
            .click(&json!({"x": 100, "y": 200}))
            .await
            .unwrap();

        assert_eq!(outcome.message, "Clicked at (100, 200)");
        assert!(outcome.path.is_none());

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0], (Operation::Click, vec!["100".to_string(), "200".to_string()]));
    }

    #[tokio::test]
    async fn click_without_coordinates_never_invokes_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let err = automation(&backend, dir.path())
            .click(&json!({"x": 100}))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::MissingCoordinates));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn click_failure_is_command_failed() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::failing("denied"));
        let err = automation(&backend, dir.path())
            .run(Operation::Click, &json!({"x": 1, "y": 2}))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Failed to perform click");
    }
}
