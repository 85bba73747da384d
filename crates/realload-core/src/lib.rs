//! realload-core — the scoring half of the real-load placement extension.
//!
//! Holds the latest observed load per node and turns it into placement
//! scores. Sampling the metrics backend lives in `realload-plugin`; this
//! crate has no I/O beyond reading its config file.
//!
//! # Components
//!
//! - **`cache`** — `LoadCache`, the concurrent latest-value store
//! - **`scorer`** — `LoadScorer`, one cache lookup per candidate node
//! - **`normalize`** — batch rescaling into `[MIN_NODE_SCORE, MAX_NODE_SCORE]`
//! - **`framework`** — plugin traits and the scoring-round driver
//! - **`config`** — plugin arguments and the daemon config file

pub mod cache;
pub mod config;
pub mod error;
pub mod framework;
pub mod normalize;
pub mod scorer;

pub use cache::LoadCache;
pub use config::{PluginArgs, RealloadConfig, ServerConfig};
pub use error::{ConfigError, ConfigResult, ScoreError, ScoreResult};
pub use framework::{NodeFailure, ScoreExtensions, ScorePlugin, ScoreRound, run_score_round};
pub use normalize::{MAX_NODE_SCORE, MIN_NODE_SCORE, NodeScore, normalize_scores};
pub use scorer::LoadScorer;
