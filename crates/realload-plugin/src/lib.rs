//! realload-plugin — the `CpuRealUsage` scoring plugin.
//!
//! Periodically asks Prometheus for per-node CPU utilization, keeps the
//! latest value per node in a `LoadCache`, and scores nodes from it.
//!
//! # Architecture
//!
//! ```text
//! CpuRealUsage
//!   ├── LoadSampler (background task, one instant query per interval)
//!   │   ├── PrometheusClient::query() → QueryResponse
//!   │   └── LoadCache::store() per (node, value)
//!   ├── LoadScorer::score_one() ← ScorePlugin::score
//!   └── normalize_scores()       ← ScoreExtensions::normalize_score
//! ```
//!
//! # Failure policy
//!
//! A failed sampling cycle (unreachable backend, timeout, empty or
//! malformed result) is logged and leaves the cache untouched; the next
//! cycle starts fresh. Scoring an unobserved node fails that node only.

pub mod error;
pub mod plugin;
pub mod prometheus;
pub mod sampler;
pub mod stats;

pub use error::{SampleError, SampleResult};
pub use plugin::{CpuRealUsage, PLUGIN_NAME};
pub use prometheus::{MetricsSource, PrometheusClient, QueryResponse, QueryResult, VectorSample};
pub use sampler::{LoadSampler, RefreshOutcome};
pub use stats::{SamplerStats, SamplerStatus};
