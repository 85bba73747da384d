//! `CpuRealUsage` — scores nodes by their real CPU utilization.
//!
//! Owns the load cache and hands it to both the sampler and the scorer.
//! The sampler loop only starts when `spawn_sampler` is called, so a host
//! can construct the plugin (and fail fast on bad arguments) before it
//! has a runtime to run background work on.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use realload_core::{
    ConfigResult, LoadCache, LoadScorer, NodeScore, PluginArgs, ScoreExtensions, ScorePlugin,
    ScoreResult, normalize_scores,
};

use crate::prometheus::{MetricsSource, PrometheusClient};
use crate::sampler::{LoadSampler, RefreshOutcome};
use crate::stats::SamplerStatus;

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "CpuRealUsage";

pub struct CpuRealUsage<S = PrometheusClient> {
    args: PluginArgs,
    scorer: LoadScorer,
    sampler: Arc<LoadSampler<S>>,
}

impl CpuRealUsage<PrometheusClient> {
    /// Validate `args` and build a plugin sampling from Prometheus.
    pub fn new(args: PluginArgs) -> ConfigResult<Self> {
        args.validate()?;
        let cache = Arc::new(LoadCache::new());
        let sampler = LoadSampler::from_args(&args, Arc::clone(&cache))?;
        Ok(Self::assemble(args, cache, sampler))
    }
}

impl<S: MetricsSource> CpuRealUsage<S> {
    /// Validate `args` and build a plugin sampling from `source`.
    pub fn with_source(args: PluginArgs, source: S) -> ConfigResult<Self> {
        args.validate()?;
        let cache = Arc::new(LoadCache::new());
        let sampler = LoadSampler::with_source(source, &args, Arc::clone(&cache));
        Ok(Self::assemble(args, cache, sampler))
    }

    fn assemble(args: PluginArgs, cache: Arc<LoadCache>, sampler: LoadSampler<S>) -> Self {
        if !sampler.is_enabled() {
            warn!("prometheus_api_addr is empty, load sampling disabled; every node will fail to score");
        } else if args.query_metric_time_seconds >= args.query_metric_interval_seconds {
            warn!(
                timeout_secs = args.query_metric_time_seconds,
                interval_secs = args.query_metric_interval_seconds,
                "query timeout is not shorter than the refresh interval"
            );
        }

        info!(
            plugin = PLUGIN_NAME,
            addr = %args.prometheus_api_addr,
            query = %args.query,
            "plugin initialized"
        );

        Self {
            args,
            scorer: LoadScorer::new(cache),
            sampler: Arc::new(sampler),
        }
    }

    pub fn args(&self) -> &PluginArgs {
        &self.args
    }

    pub fn cache(&self) -> &Arc<LoadCache> {
        self.scorer.cache()
    }

    pub fn sampler(&self) -> &Arc<LoadSampler<S>> {
        &self.sampler
    }

    /// Run one sampling cycle now, outside the periodic loop.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.sampler.refresh().await
    }

    pub fn sampler_status(&self) -> SamplerStatus {
        self.sampler.stats().snapshot(self.sampler.is_enabled())
    }
}

impl<S: MetricsSource + 'static> CpuRealUsage<S> {
    /// Start the periodic sampling loop on the current runtime.
    pub fn spawn_sampler(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let sampler = Arc::clone(&self.sampler);
        tokio::spawn(async move { sampler.run(shutdown).await })
    }
}

impl<S: MetricsSource> ScorePlugin for CpuRealUsage<S> {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn score(&self, node: &str) -> ScoreResult<i64> {
        self.scorer.score_one(node)
    }

    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        Some(self)
    }
}

impl<S: MetricsSource> ScoreExtensions for CpuRealUsage<S> {
    fn normalize_score(&self, scores: &mut [NodeScore]) -> ScoreResult<()> {
        normalize_scores(scores);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::SystemTime;

    use realload_core::{ConfigError, ScoreError, run_score_round};

    use crate::error::{SampleError, SampleResult};
    use crate::prometheus::{QueryResponse, QueryResult, VectorSample};

    struct StaticSource(Vec<(&'static str, f64)>);

    impl MetricsSource for StaticSource {
        async fn query(&self, _expr: &str, _at: SystemTime) -> SampleResult<QueryResponse> {
            if self.0.is_empty() {
                return Err(SampleError::Empty);
            }
            Ok(QueryResponse {
                result: QueryResult::Vector(
                    self.0
                        .iter()
                        .map(|(node, value)| VectorSample {
                            metric: HashMap::from([("node".to_string(), node.to_string())]),
                            timestamp: 0.0,
                            value: *value,
                        })
                        .collect(),
                ),
                warnings: Vec::new(),
            })
        }
    }

    fn args() -> PluginArgs {
        PluginArgs::new("http://prometheus:9090", 30, 5)
    }

    fn nodes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn scores_and_normalizes_after_refresh() {
        let plugin = CpuRealUsage::with_source(
            args(),
            StaticSource(vec![("node-a", 150.4), ("node-b", 250.0), ("node-c", 350.9)]),
        )
        .unwrap();

        assert!(plugin.refresh().await.is_updated());

        let round = run_score_round(&plugin, &nodes(&["node-a", "node-b", "node-c"])).unwrap();
        let scores: Vec<(&str, i64)> =
            round.scores.iter().map(|n| (n.name.as_str(), n.score)).collect();
        assert_eq!(scores, vec![("node-a", 100), ("node-b", 50), ("node-c", 0)]);
        assert!(round.failures.is_empty());
    }

    #[tokio::test]
    async fn unknown_node_fails_alone() {
        let plugin =
            CpuRealUsage::with_source(args(), StaticSource(vec![("node-a", 10.0), ("node-b", 20.0)]))
                .unwrap();
        plugin.refresh().await;

        assert_eq!(
            plugin.score("unknown-node"),
            Err(ScoreError::NodeLoadUnknown("unknown-node".to_string()))
        );

        let round = run_score_round(&plugin, &nodes(&["node-a", "unknown-node", "node-b"])).unwrap();
        assert_eq!(round.scores.len(), 2);
        assert_eq!(round.failures.len(), 1);
        assert_eq!(plugin.cache().len(), 2);
    }

    #[tokio::test]
    async fn scoring_before_first_sample_fails_every_node() {
        let plugin = CpuRealUsage::with_source(args(), StaticSource(vec![])).unwrap();
        plugin.refresh().await;

        let round = run_score_round(&plugin, &nodes(&["node-a", "node-b"])).unwrap();
        assert!(round.scores.is_empty());
        assert_eq!(round.failures.len(), 2);
        assert_eq!(plugin.sampler_status().consecutive_failures, 1);
    }

    #[test]
    fn empty_address_disables_sampling() {
        let plugin = CpuRealUsage::new(PluginArgs::new("", 30, 5)).unwrap();
        assert!(!plugin.sampler().is_enabled());
        assert!(!plugin.sampler_status().enabled);
        assert_eq!(plugin.name(), PLUGIN_NAME);
    }

    #[test]
    fn invalid_args_refuse_to_construct() {
        let result = CpuRealUsage::new(PluginArgs::new("http://prometheus:9090", 0, 5));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = CpuRealUsage::new(PluginArgs::new("ftp://prometheus", 30, 5));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn timeout_longer_than_interval_is_allowed() {
        let plugin = CpuRealUsage::new(PluginArgs::new("http://prometheus:9090", 5, 30));
        assert!(plugin.is_ok());
    }

    #[tokio::test]
    async fn spawned_sampler_stops_on_shutdown() {
        let plugin = CpuRealUsage::with_source(args(), StaticSource(vec![("node-a", 1.0)])).unwrap();
        let (tx, rx) = watch::channel(false);

        let handle = plugin.spawn_sampler(rx);
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
