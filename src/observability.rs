use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;

/// Counter: availability searches. Labels: outcome (`live`, `fallback`, `error`).
pub const SEARCHES_TOTAL: &str = "vacancy_searches_total";

/// Histogram: end-to-end search latency in seconds.
pub const SEARCH_DURATION_SECONDS: &str = "vacancy_search_duration_seconds";

/// Counter: crawler invocations. Labels: status.
pub const CRAWLS_TOTAL: &str = "vacancy_crawls_total";

/// Histogram: single crawler run duration in seconds.
pub const CRAWL_DURATION_SECONDS: &str = "vacancy_crawl_duration_seconds";

/// Counter: scraper result entries received across all partitions.
pub const SLOT_RESULTS_TOTAL: &str = "vacancy_slot_results_total";

/// Counter: result entries skipped because their venue is not in the catalog.
pub const UNKNOWN_GROUPS_TOTAL: &str = "vacancy_unknown_groups_total";

/// Histogram: rooms returned per search.
pub const ROOMS_RETURNED: &str = "vacancy_rooms_returned";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
