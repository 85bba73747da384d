//! Prometheus text exposition format.
//!
//! Renders the cached node loads and sampler counters for scraping.

use std::fmt::Write;

use realload_plugin::SamplerStatus;

/// Render cached loads and sampler status into Prometheus text format.
pub fn render_prometheus(loads: &[(String, f64)], status: &SamplerStatus) -> String {
    let mut out = String::new();

    out.push_str("# HELP realload_node_load Latest sampled load per node.\n");
    out.push_str("# TYPE realload_node_load gauge\n");
    for (node, load) in loads {
        let _ = writeln!(out, "realload_node_load{{node=\"{}\"}} {load:.2}", escape_label(node));
    }

    out.push_str("# HELP realload_cached_nodes Number of nodes with a cached load.\n");
    out.push_str("# TYPE realload_cached_nodes gauge\n");
    let _ = writeln!(out, "realload_cached_nodes {}", loads.len());

    out.push_str("# HELP realload_sampler_cycles_total Sampling cycles run.\n");
    out.push_str("# TYPE realload_sampler_cycles_total counter\n");
    let _ = writeln!(out, "realload_sampler_cycles_total {}", status.cycles);

    out.push_str("# HELP realload_sampler_successes_total Sampling cycles that updated the cache.\n");
    out.push_str("# TYPE realload_sampler_successes_total counter\n");
    let _ = writeln!(out, "realload_sampler_successes_total {}", status.successes);

    out.push_str("# HELP realload_sampler_consecutive_failures Failed cycles since the last success.\n");
    out.push_str("# TYPE realload_sampler_consecutive_failures gauge\n");
    let _ = writeln!(
        out,
        "realload_sampler_consecutive_failures {}",
        status.consecutive_failures
    );

    out.push_str("# HELP realload_sampler_last_success_timestamp_seconds Unix time of the last successful cycle.\n");
    out.push_str("# TYPE realload_sampler_last_success_timestamp_seconds gauge\n");
    let _ = writeln!(
        out,
        "realload_sampler_last_success_timestamp_seconds {}",
        status.last_success_epoch.unwrap_or(0)
    );

    out
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
