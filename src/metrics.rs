use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Gauge, Histogram, register_counter_vec, register_gauge, register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: CounterVec = register_counter_vec!(
        "relay_requests_total",
        "Balance checks by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .unwrap();
    pub static ref RATE_LIMITED: CounterVec = register_counter_vec!(
        "relay_rate_limited_total",
        "Requests rejected by the rate limiter",
        &["endpoint"]
    )
    .unwrap();
    pub static ref PROVIDER_LATENCY: Histogram = register_histogram!(
        "relay_provider_latency_seconds",
        "Latency of outbound JSON-RPC calls in seconds"
    )
    .unwrap();
    pub static ref RATE_WINDOWS: Gauge =
        register_gauge!("relay_rate_windows", "Live rate limit windows").unwrap();
}
