//! Error types for scoring and configuration.

use thiserror::Error;

/// Errors returned on the scoring path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// The node has never been observed by the sampler.
    #[error("load for node {0} not found in cache")]
    NodeLoadUnknown(String),

    /// Returned by `ScoreExtensions` implementations outside this crate
    /// whose normalization can fail. `run_score_round` fails the whole
    /// round with it. `normalize_scores` itself is total.
    #[error("plugin {plugin} failed to normalize scores: {reason}")]
    Normalize { plugin: String, reason: String },
}

pub type ScoreResult<T> = Result<T, ScoreError>;

/// Errors raised while loading or validating configuration.
///
/// These are fatal: a plugin is never constructed from arguments that
/// fail validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid plugin arguments: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
