//! HTTP transport.
//!
//! A thin alternative to the stdio MCP loop exposing the same two operations:
//!
//! - `POST /screenshot` → `200 {"message", "path"}`
//! - `POST /click` with `{"x", "y"}` → `200 {"message"}`
//!
//! Missing or non-numeric coordinates answer `400 {"error"}`. A failing
//! automation command answers `500 {"error", "details"}`, any other failure
//! `500 {"error"}`.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};

use crate::automation::{Automation, OperationOutcome};
use crate::error::BridgeError;

type Reply = (StatusCode, Json<Value>);

/// Builds the HTTP routes.
pub fn routes(automation: Automation) -> Router {
    Router::new()
        .route("/screenshot", post(screenshot))
        .route("/click", post(click))
        .with_state(automation)
}

/// Serves the HTTP transport until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, automation: Automation) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP transport listening");

    axum::serve(listener, routes(automation))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
            tracing::info!("Shutting down HTTP transport");
        })
        .await
}

/// `POST /screenshot`
pub async fn screenshot(State(automation): State<Automation>) -> Reply {
    match automation.screenshot().await {
        Ok(outcome) => ok(&outcome),
        Err(err) => failure(&err),
    }
}

/// `POST /click`
pub async fn click(State(automation): State<Automation>, body: Bytes) -> Reply {
    let params: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    match automation.click(&params).await {
        Ok(outcome) => ok(&outcome),
        Err(err) => failure(&err),
    }
}

fn ok(outcome: &OperationOutcome) -> Reply {
    let mut body = json!({ "message": outcome.message });
    if let Some(path) = &outcome.path {
        body["path"] = json!(path);
    }
    (StatusCode::OK, Json(body))
}

fn failure(err: &BridgeError) -> Reply {
    match err {
        BridgeError::MissingCoordinates | BridgeError::InvalidCoordinates => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        ),
        BridgeError::CommandFailed { stderr, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string(), "details": stderr })),
        ),
        _ => {
            tracing::error!(error = %err, "HTTP request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.message() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::automation::testing::FakeBackend;
    use crate::automation::AutomationBackend;

    fn automation(backend: FakeBackend, dir: &std::path::Path) -> Automation {
        Automation::new(Arc::new(backend) as Arc<dyn AutomationBackend>, dir)
    }

    #[tokio::test]
    async fn screenshot_returns_message_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let (status, Json(body)) =
            screenshot(State(automation(FakeBackend::default(), dir.path()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Screenshot taken successfully");
        assert!(body["path"].as_str().unwrap().ends_with("screenshot.png"));
        assert!(body.get("image").is_none());
    }

    #[tokio::test]
    async fn click_without_y_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let (status, Json(body)) = click(
            State(automation(FakeBackend::default(), dir.path())),
            Bytes::from_static(br#"{"x": 1}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "x and y coordinates are required");
    }

    #[tokio::test]
    async fn click_with_empty_body_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = click(
            State(automation(FakeBackend::default(), dir.path())),
            Bytes::new(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn click_success() {
        let dir = tempfile::tempdir().unwrap();
        let (status, Json(body)) = click(
            State(automation(FakeBackend::default(), dir.path())),
            Bytes::from_static(br#"{"x": 3, "y": 4}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Clicked at (3, 4)" }));
    }

    #[tokio::test]
    async fn command_failure_is_server_error_with_details() {
        let dir = tempfile::tempdir().unwrap();
        let (status, Json(body)) = click(
            State(automation(FakeBackend::failing("not permitted"), dir.path())),
            Bytes::from_static(br#"{"x": 3, "y": 4}"#),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to perform click");
        assert_eq!(body["details"], "not permitted");
    }
}
