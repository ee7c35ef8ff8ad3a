use axum::{routing::get, Router};
use metrics::{describe_gauge, gauge, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured refresh interval.
    pub fn init(refresh_interval_secs: u64) -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        describe_gauge!(
            "democracy_index",
            "Weighted democracy index after the last refresh, in (-100, 100)."
        );
        describe_gauge!(
            "events_stored",
            Unit::Count,
            "Events in the merged collection."
        );
        describe_gauge!(
            "ingest_refresh_interval_secs",
            Unit::Seconds,
            "Configured refresh interval."
        );
        gauge!("ingest_refresh_interval_secs").set(refresh_interval_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
