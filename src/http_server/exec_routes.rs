//! Set execution HTTP routes
//!
//! - `POST /v1/sets/:name/exec` with `{"vars": {..}, "explain": false}`
//! - `GET /v1/sets` lists registered set names
//! - `GET /metrics` returns execution counters

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::definition::{DefinitionRegistry, SetLookup};
use crate::engine::{ExecOptions, ExecutionContext, SetExecutor, SetResult};
use crate::observability::MetricsSnapshot;

/// Header carrying a caller-chosen request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// State shared across execution handlers
pub struct ExecState {
    pub registry: Arc<DefinitionRegistry>,
    pub executor: Arc<SetExecutor>,
    /// Deadline applied to each execution
    pub timeout: Duration,
}

impl ExecState {
    pub fn new(
        registry: Arc<DefinitionRegistry>,
        executor: Arc<SetExecutor>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            executor,
            timeout,
        }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct ExecRequest {
    #[serde(default)]
    pub vars: HashMap<String, String>,
    #[serde(default)]
    pub explain: bool,
}

#[derive(Debug, Serialize)]
pub struct SetsListResponse {
    pub sets: Vec<String>,
    pub total: usize,
}

/// Create execution routes
pub fn exec_routes(state: Arc<ExecState>) -> Router {
    Router::new()
        .route("/v1/sets", get(list_sets_handler))
        .route("/v1/sets/:name/exec", post(exec_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

fn request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::new_v4)
}

fn failure(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(SetResult::Failure(message.into()).to_json()))
}

// ==================
// Handlers
// ==================

async fn exec_handler(
    State(state): State<Arc<ExecState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let request: ExecRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ExecRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                return failure(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
            }
        }
    };

    let set = match state.registry.set_by_name(&name) {
        Ok(set) => set,
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return failure(status, e.to_string());
        }
    };

    let ctx = ExecutionContext::new()
        .with_request_id(request_id(&headers))
        .with_timeout(state.timeout);
    let options = ExecOptions {
        explain: request.explain,
    };

    let outcome = state
        .executor
        .try_execute(&set, request.vars, &ctx, &options)
        .await;

    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    (status, Json(SetResult::from(outcome).to_json()))
}

async fn list_sets_handler(
    State(state): State<Arc<ExecState>>,
) -> Result<Json<SetsListResponse>, (StatusCode, Json<Value>)> {
    let sets = state
        .registry
        .set_names()
        .map_err(|e| failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(SetsListResponse {
        total: sets.len(),
        sets,
    }))
}

async fn metrics_handler(State(state): State<Arc<ExecState>>) -> Json<MetricsSnapshot> {
    Json(state.executor.metrics().snapshot())
}
