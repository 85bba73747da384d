//! Scoring framework seam.
//!
//! A host orchestrator drives any plugin through two call shapes: a raw
//! score per candidate node, then one normalization pass over the batch.
//! `run_score_round` is that driver for hosts that don't bring their own.

use tracing::{debug, warn};

use crate::error::ScoreResult;
use crate::normalize::NodeScore;

/// A plugin that can score a single candidate node.
pub trait ScorePlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Raw score for one node. An error excludes that node from this round.
    fn score(&self, node: &str) -> ScoreResult<i64>;

    /// Batch normalization hook, if the plugin has one.
    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        None
    }
}

/// Batch hook run once per round over every successfully scored node.
pub trait ScoreExtensions: Send + Sync {
    fn normalize_score(&self, scores: &mut [NodeScore]) -> ScoreResult<()>;
}

/// A node that could not be scored this round.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of one scoring round.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScoreRound {
    /// Scored nodes in candidate order (normalized if the plugin normalizes).
    pub scores: Vec<NodeScore>,
    /// Nodes whose `score` call failed.
    pub failures: Vec<NodeFailure>,
}

/// Score every candidate, then normalize the successful ones.
///
/// A failing node never aborts the round. Normalization is skipped when no
/// node could be scored, since it needs a non-empty batch.
pub fn run_score_round<P>(plugin: &P, nodes: &[String]) -> ScoreResult<ScoreRound>
where
    P: ScorePlugin + ?Sized,
{
    let mut round = ScoreRound::default();

    for node in nodes {
        match plugin.score(node) {
            Ok(score) => round.scores.push(NodeScore::new(node.clone(), score)),
            Err(e) => {
                warn!(plugin = plugin.name(), %node, error = %e, "node excluded from scoring round");
                round.failures.push(NodeFailure {
                    name: node.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if !round.scores.is_empty() {
        if let Some(ext) = plugin.score_extensions() {
            ext.normalize_score(&mut round.scores)?;
        }
    }

    debug!(
        plugin = plugin.name(),
        scored = round.scores.len(),
        failed = round.failures.len(),
        "scoring round complete"
    );
    Ok(round)
}
