//! Sampling error types.

use std::time::Duration;

use thiserror::Error;

/// Why a sampling cycle was abandoned.
///
/// None of these reach the scoring path; they are logged and recorded in
/// `SamplerStats`.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("prometheus returned status {0}")]
    Status(http::StatusCode),

    #[error("prometheus query failed ({error_type}): {error}")]
    Backend { error_type: String, error: String },

    #[error("failed to decode prometheus response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid sample value {0:?}")]
    InvalidValue(String),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("query returned warnings: {}", .0.join("; "))]
    Warnings(Vec<String>),

    #[error("query returned no data")]
    Empty,

    #[error("none of the {skipped} returned samples carried a node label and a finite value")]
    NoUsableSamples { skipped: usize },

    #[error("query returned a {0} result, expected a vector")]
    UnexpectedResultType(&'static str),
}

pub type SampleResult<T> = Result<T, SampleError>;
