//! Axum router and server for the HTTP control surface.
//!
//! | Method | Path                | Body |
//! |--------|---------------------|------|
//! | GET    | `/health`           | `ok` |
//! | GET    | `/api/status`       | `{name: status}` |
//! | GET    | `/api/processes`    | `[name, ...]` |
//! | POST   | `/api/start/{name}` | `{result, outcome}` |
//! | POST   | `/api/stop/{name}`  | `{result, outcome}` |
//! | GET    | `/api/info/{name}`  | process description |
//! | POST   | `/api/start-all`    | `[outcome, ...]` |
//! | POST   | `/api/stop-all`     | `[outcome, ...]` |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::manager::ProcessManager;
use crate::models::LifecycleOutcome;
use crate::{AppError, Result};

type SharedManager = Arc<ProcessManager>;

/// Build the control surface router.
#[must_use]
pub fn router(manager: SharedManager) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/processes", get(list))
        .route("/api/start/{name}", post(start))
        .route("/api/stop/{name}", post(stop))
        .route("/api/info/{name}", get(describe))
        .route("/api/start-all", post(start_all))
        .route("/api/stop-all", post(stop_all))
        .with_state(manager)
}

/// Bind `host:port` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the address cannot be bound or the server
/// fails.
pub async fn serve_http(
    manager: SharedManager,
    host: &str,
    port: u16,
    ct: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|err| AppError::Http(format!("failed to bind {host}:{port}: {err}")))?;
    serve_on(listener, manager, ct).await
}

/// Serve on an already bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the server fails.
pub async fn serve_on(
    listener: TcpListener,
    manager: SharedManager,
    ct: CancellationToken,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|err| AppError::Http(format!("listener has no local address: {err}")))?;
    info!(%addr, "HTTP control surface listening");

    axum::serve(listener, router(manager))
        .with_graceful_shutdown(async move {
            ct.cancelled().await;
        })
        .await
        .map_err(|err| AppError::Http(format!("server error: {err}")))?;

    info!("HTTP control surface shut down");
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(manager): State<SharedManager>) -> Response {
    Json(manager.status().await).into_response()
}

async fn list(State(manager): State<SharedManager>) -> Response {
    Json(manager.list().await).into_response()
}

async fn start(State(manager): State<SharedManager>, Path(name): Path<String>) -> Response {
    lifecycle_response(manager.start(&name).await)
}

async fn stop(State(manager): State<SharedManager>, Path(name): Path<String>) -> Response {
    lifecycle_response(manager.stop(&name).await)
}

async fn describe(State(manager): State<SharedManager>, Path(name): Path<String>) -> Response {
    match manager.describe(&name).await {
        Ok(description) => Json(description).into_response(),
        Err(err) => error_response(err),
    }
}

async fn start_all(State(manager): State<SharedManager>) -> Response {
    Json(manager.start_all().await).into_response()
}

async fn stop_all(State(manager): State<SharedManager>) -> Response {
    Json(manager.stop_all().await).into_response()
}

fn lifecycle_response(result: Result<LifecycleOutcome>) -> Response {
    match result {
        Ok(outcome) => Json(serde_json::json!({
            "result": outcome.message,
            "outcome": outcome,
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AppError) -> Response {
    let (code, detail) = match err {
        AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        other => {
            warn!(%other, "control request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    };
    (code, Json(serde_json::json!({ "detail": detail }))).into_response()
}
