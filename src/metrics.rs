use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("trades_ingested_total").absolute(0);
    counter!("trades_duplicate_total").absolute(0);
    counter!("records_malformed_total").absolute(0);
    counter!("feed_poll_errors_total").absolute(0);
    counter!("alerts_notified_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("cycle_latency_seconds").record(0.0);

    handle
}
