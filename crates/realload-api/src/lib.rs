//! realload-api — HTTP surface of the real-load scoring plugin.
//!
//! Lets a placement engine that cannot link the plugin drive it over
//! HTTP, and exposes what the sampler has seen.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/score` | Run one scoring round over `{"nodes": [...]}` |
//! | GET | `/api/v1/nodes` | List cached node loads |
//! | GET | `/api/v1/nodes/{name}/load` | Cached load and raw score for one node |
//! | GET | `/api/v1/sampler` | Sampler status |
//! | GET | `/healthz` | Liveness |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;
pub mod prometheus;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use realload_plugin::CpuRealUsage;

pub use prometheus::render_prometheus;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub plugin: Arc<CpuRealUsage>,
}

/// Build the complete API router.
pub fn build_router(plugin: Arc<CpuRealUsage>) -> Router {
    let api_state = ApiState { plugin };

    let api_routes = Router::new()
        .route("/score", post(handlers::score_nodes))
        .route("/nodes", get(handlers::list_nodes))
        .route("/nodes/{name}/load", get(handlers::get_node_load))
        .route("/sampler", get(handlers::sampler_status))
        .with_state(api_state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::prometheus_metrics).with_state(api_state))
}
