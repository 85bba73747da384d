//! REST API handlers.
//!
//! Scoring goes through `run_score_round`, exactly as an in-process host
//! would drive the plugin. Every JSON response uses the same envelope.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tracing::{debug, error};

use realload_core::{ScorePlugin, run_score_round};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Scoring ────────────────────────────────────────────────────

/// Score request body.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct ScoreRequest {
    pub nodes: Vec<String>,
}

/// POST /api/v1/score
pub async fn score_nodes(
    State(state): State<ApiState>,
    Json(req): Json<ScoreRequest>,
) -> impl IntoResponse {
    if req.nodes.is_empty() {
        return error_response("nodes must not be empty", StatusCode::BAD_REQUEST).into_response();
    }

    debug!(candidates = req.nodes.len(), "scoring round requested");
    match run_score_round(state.plugin.as_ref(), &req.nodes) {
        Ok(round) => ApiResponse::ok(round).into_response(),
        Err(e) => {
            error!(error = %e, "scoring round failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

// ── Cache ──────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct NodeLoad {
    pub name: String,
    pub load: f64,
}

/// GET /api/v1/nodes
pub async fn list_nodes(State(state): State<ApiState>) -> impl IntoResponse {
    let nodes: Vec<NodeLoad> = state
        .plugin
        .cache()
        .snapshot()
        .into_iter()
        .map(|(name, load)| NodeLoad { name, load })
        .collect();
    ApiResponse::ok(nodes)
}

/// GET /api/v1/nodes/:name/load
pub async fn get_node_load(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let Some(load) = state.plugin.cache().load(&name) else {
        return error_response("node load unknown", StatusCode::NOT_FOUND).into_response();
    };

    match state.plugin.score(&name) {
        Ok(raw_score) => ApiResponse::ok(serde_json::json!({
            "name": name,
            "load": load,
            "raw_score": raw_score,
        }))
        .into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::NOT_FOUND).into_response(),
    }
}

// ── Sampler ────────────────────────────────────────────────────

/// GET /api/v1/sampler
pub async fn sampler_status(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.plugin.sampler_status())
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = crate::prometheus::render_prometheus(
        &state.plugin.cache().snapshot(),
        &state.plugin.sampler_status(),
    );
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
