//! Load sampler — keeps the `LoadCache` fresh from the metrics backend.
//!
//! `refresh()` runs one sampling cycle and reports what happened; `run()`
//! repeats it on a fixed interval until shutdown. A cycle either stores
//! every usable sample it received or stores nothing at all.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use realload_core::{ConfigResult, LoadCache, PluginArgs};

use crate::error::SampleError;
use crate::prometheus::{MetricsSource, PrometheusClient, QueryResult};
use crate::stats::SamplerStats;

/// Result of one sampling cycle.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// No backend address is configured.
    Disabled,
    /// Samples were written to the cache.
    Updated { stored: usize, skipped: usize },
    /// The cycle was abandoned; the cache was not touched.
    Aborted(SampleError),
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated { .. })
    }
}

/// Periodic sampler writing per-node load into a shared cache.
pub struct LoadSampler<S> {
    /// `None` when sampling is disabled.
    source: Option<S>,
    cache: Arc<LoadCache>,
    query: String,
    node_label: String,
    interval: Duration,
    timeout: Duration,
    stats: Arc<SamplerStats>,
}

impl LoadSampler<PrometheusClient> {
    /// Sampler against the Prometheus server named in `args`.
    ///
    /// An empty address yields a sampler whose every cycle is a no-op.
    pub fn from_args(args: &PluginArgs, cache: Arc<LoadCache>) -> ConfigResult<Self> {
        let source = if args.sampling_enabled() {
            Some(PrometheusClient::from_args(args)?)
        } else {
            None
        };
        Ok(Self::build(source, args, cache))
    }
}

impl<S: MetricsSource> LoadSampler<S> {
    /// Sampler against an arbitrary metrics source.
    pub fn with_source(source: S, args: &PluginArgs, cache: Arc<LoadCache>) -> Self {
        Self::build(Some(source), args, cache)
    }

    fn build(source: Option<S>, args: &PluginArgs, cache: Arc<LoadCache>) -> Self {
        Self {
            source,
            cache,
            query: args.query.clone(),
            node_label: args.node_label.clone(),
            interval: args.interval(),
            timeout: args.timeout(),
            stats: Arc::new(SamplerStats::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    pub fn stats(&self) -> &Arc<SamplerStats> {
        &self.stats
    }

    pub fn cache(&self) -> &Arc<LoadCache> {
        &self.cache
    }

    /// Run one sampling cycle.
    ///
    /// Never fails outward: a cycle that cannot produce a usable vector is
    /// logged, recorded in the stats, and reported as `Aborted`.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(source) = &self.source else {
            return RefreshOutcome::Disabled;
        };

        info!(query = %self.query, "load sampling cycle started");

        let response = match tokio::time::timeout(
            self.timeout,
            source.query(&self.query, SystemTime::now()),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return self.abort(e),
            Err(_) => return self.abort(SampleError::Timeout(self.timeout)),
        };

        if !response.warnings.is_empty() {
            debug!(warnings = ?response.warnings, query = %self.query, "prometheus returned warnings");
            return self.abort(SampleError::Warnings(response.warnings));
        }

        let samples = match response.result {
            QueryResult::Vector(samples) => samples,
            other => return self.abort(SampleError::UnexpectedResultType(other.kind())),
        };
        if samples.is_empty() {
            return self.abort(SampleError::Empty);
        }

        let mut stored = 0;
        let mut skipped = 0;
        for sample in &samples {
            let Some(node) = sample
                .metric
                .get(&self.node_label)
                .filter(|n| !n.is_empty())
            else {
                warn!(label = %self.node_label, metric = ?sample.metric, "sample has no node label, skipping");
                skipped += 1;
                continue;
            };
            if !sample.value.is_finite() {
                warn!(%node, value = sample.value, "non-finite load sample, skipping");
                skipped += 1;
                continue;
            }

            self.cache.store(node, sample.value);
            debug!(%node, value = sample.value, query = %self.query, "stored load sample");
            stored += 1;
        }

        if stored == 0 {
            return self.abort(SampleError::NoUsableSamples { skipped });
        }

        self.stats.record_success(stored);
        info!(stored, skipped, "load sampling cycle finished");
        RefreshOutcome::Updated { stored, skipped }
    }

    fn abort(&self, error: SampleError) -> RefreshOutcome {
        warn!(error = %error, query = %self.query, "load sampling cycle aborted, keeping cached values");
        self.stats.record_failure(&error);
        RefreshOutcome::Aborted(error)
    }

    /// Refresh immediately, then once per interval, until shutdown.
    ///
    /// The interval is measured from the end of one cycle to the start of
    /// the next, so cycles never overlap. Shutdown is observed while
    /// sleeping and while a query is in flight; an in-flight query is
    /// dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            enabled = self.is_enabled(),
            interval_secs = self.interval.as_secs(),
            timeout_secs = self.timeout.as_secs(),
            "load sampler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = self.refresh() => {}
                _ = shutdown.changed() => {
                    debug!("shutdown during sampling cycle, abandoning query");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("load sampler stopped");
    }
}
