//! Per-node raw scoring from the load cache.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::LoadCache;
use crate::error::{ScoreError, ScoreResult};

/// Reads the latest load for a node and turns it into a raw score.
#[derive(Debug, Clone)]
pub struct LoadScorer {
    cache: Arc<LoadCache>,
}

impl LoadScorer {
    pub fn new(cache: Arc<LoadCache>) -> Self {
        Self { cache }
    }

    /// Raw score for `node`: its cached load truncated toward zero.
    ///
    /// A node the sampler has never observed is an error for that node
    /// only; it is never defaulted to zero load.
    pub fn score_one(&self, node: &str) -> ScoreResult<i64> {
        match self.cache.load(node) {
            Some(load) => {
                let raw = load as i64;
                debug!(%node, load, raw, "scored node from cached load");
                Ok(raw)
            }
            None => {
                warn!(%node, "node load not found in cache");
                Err(ScoreError::NodeLoadUnknown(node.to_string()))
            }
        }
    }

    pub fn cache(&self) -> &Arc<LoadCache> {
        &self.cache
    }
}
