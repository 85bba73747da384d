//! Batch score normalization.
//!
//! Maps one scoring round's raw scores onto `[MIN_NODE_SCORE, MAX_NODE_SCORE]`
//! with the preference inverted: the least-loaded node gets `MAX_NODE_SCORE`,
//! the most-loaded gets `MIN_NODE_SCORE`, everything else is interpolated
//! linearly and truncated toward zero.
//!
//! ```text
//! raw:        {a: 150, b: 250, c: 350}
//! old_range = 350 - 150 = 200
//! new_range = 100 - 0   = 100
//! a: 100 - (150 - 150) * 100 / 200 = 100
//! b: 100 - (250 - 150) * 100 / 200 = 50
//! c: 100 - (350 - 150) * 100 / 200 = 0
//! ```
//!
//! When every node reports the same raw score the signal carries no
//! information and every node gets `MIN_NODE_SCORE`.

use tracing::debug;

/// Lowest score a node can receive.
pub const MIN_NODE_SCORE: i64 = 0;
/// Highest score a node can receive.
pub const MAX_NODE_SCORE: i64 = 100;

/// A node's score within one scoring round.
///
/// Holds the raw score before normalization and the normalized score after.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeScore {
    pub name: String,
    pub score: i64,
}

impl NodeScore {
    pub fn new(name: impl Into<String>, score: i64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Rescale a full batch in place.
///
/// Order, length and names are untouched. An empty batch is left as is.
pub fn normalize_scores(scores: &mut [NodeScore]) {
    let Some((lowest, highest)) = score_bounds(scores) else {
        return;
    };

    // Widened so saturated raw scores cannot overflow the subtraction or
    // the multiplication below.
    let old_range = i128::from(highest) - i128::from(lowest);
    let new_range = i128::from(MAX_NODE_SCORE - MIN_NODE_SCORE);

    for node in scores.iter_mut() {
        let raw = node.score;
        node.score = if old_range == 0 {
            MIN_NODE_SCORE
        } else {
            // 0 <= offset <= new_range, so the result stays in bounds.
            let offset = (i128::from(raw) - i128::from(lowest)) * new_range / old_range;
            MAX_NODE_SCORE - offset as i64
        };
        debug!(node = %node.name, raw, score = node.score, "normalized node score");
    }
}

/// `(lowest, highest)` raw score in a single pass, `None` for an empty batch.
fn score_bounds(scores: &[NodeScore]) -> Option<(i64, i64)> {
    scores.iter().fold(None, |bounds, node| match bounds {
        None => Some((node.score, node.score)),
        Some((lo, hi)) => Some((lo.min(node.score), hi.max(node.score))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(raw: &[(&str, i64)]) -> Vec<NodeScore> {
        raw.iter().map(|(n, s)| NodeScore::new(*n, *s)).collect()
    }

    fn scores_of(batch: &[NodeScore]) -> Vec<i64> {
        batch.iter().map(|n| n.score).collect()
    }

    #[test]
    fn inverts_linear_range() {
        let mut scores = batch(&[("a", 150), ("b", 250), ("c", 350)]);
        normalize_scores(&mut scores);
        assert_eq!(scores_of(&scores), vec![100, 50, 0]);
    }

    #[test]
    fn flat_batch_gets_min_score() {
        let mut scores = batch(&[("a", 50), ("b", 50), ("c", 50)]);
        normalize_scores(&mut scores);
        assert_eq!(scores_of(&scores), vec![MIN_NODE_SCORE; 3]);
    }

    #[test]
    fn single_node_gets_min_score() {
        let mut scores = batch(&[("only", 73)]);
        normalize_scores(&mut scores);
        assert_eq!(scores[0].score, MIN_NODE_SCORE);
    }

    #[test]
    fn empty_batch_is_untouched() {
        let mut scores: Vec<NodeScore> = Vec::new();
        normalize_scores(&mut scores);
        assert!(scores.is_empty());
    }

    #[test]
    fn interpolation_truncates_toward_zero() {
        // (1 - 0) * 100 / 3 = 33.33 → 33, so the middle node gets 67.
        let mut scores = batch(&[("a", 0), ("b", 1), ("c", 3)]);
        normalize_scores(&mut scores);
        assert_eq!(scores_of(&scores), vec![100, 67, 0]);
    }

    #[test]
    fn handles_negative_raw_scores() {
        let mut scores = batch(&[("a", -10), ("b", 0), ("c", 10)]);
        normalize_scores(&mut scores);
        assert_eq!(scores_of(&scores), vec![100, 50, 0]);
    }

    #[test]
    fn preserves_order_and_names() {
        let mut scores = batch(&[("c", 350), ("a", 150), ("b", 250), ("d", 150)]);
        normalize_scores(&mut scores);

        let names: Vec<&str> = scores.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b", "d"]);
        assert_eq!(scores_of(&scores), vec![0, 100, 50, 100]);
    }

    #[test]
    fn extreme_values_stay_in_range() {
        let mut scores = batch(&[
            ("min", i64::MIN),
            ("zero", 0),
            ("max", i64::MAX),
            ("near-max", i64::MAX - 1),
        ]);
        normalize_scores(&mut scores);

        assert_eq!(scores[0].score, MAX_NODE_SCORE);
        assert_eq!(scores[2].score, MIN_NODE_SCORE);
        for node in &scores {
            assert!((MIN_NODE_SCORE..=MAX_NODE_SCORE).contains(&node.score));
        }
    }

    #[test]
    fn many_batches_stay_bounded_and_keep_size() {
        // Deterministic spread of batch shapes: sizes 1..=40, mixed signs.
        for size in 1..=40_i64 {
            let raw: Vec<(String, i64)> = (0..size)
                .map(|i| (format!("node-{i}"), (i * 7919 + size * 31) % 1000 - 500))
                .collect();
            let mut scores: Vec<NodeScore> =
                raw.iter().map(|(n, s)| NodeScore::new(n.clone(), *s)).collect();

            normalize_scores(&mut scores);

            assert_eq!(scores.len(), raw.len());
            for ((name, _), node) in raw.iter().zip(&scores) {
                assert_eq!(name, &node.name);
                assert!(
                    (MIN_NODE_SCORE..=MAX_NODE_SCORE).contains(&node.score),
                    "{} out of range: {}",
                    node.name,
                    node.score
                );
            }
        }
    }

    #[test]
    fn lower_raw_never_scores_lower() {
        let mut scores = batch(&[("a", 12), ("b", 47), ("c", 48), ("d", 90), ("e", 91)]);
        normalize_scores(&mut scores);

        for pair in scores.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
