//! Prometheus metrics for the LIFO stack service.
//!
//! All metrics follow the naming convention: `stack_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: monotonically increasing (e.g. `stack_messages_pushed_total`)
//! - **Gauge**: current level (e.g. `stack_store_size`)
//! - **Histogram**: distribution (e.g. `stack_wait_duration_seconds`)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // STORE METRICS
    // =========================================================================

    /// Messages accepted onto the stack
    pub static ref MESSAGES_PUSHED: Counter = Counter::new(
        "stack_messages_pushed_total",
        "Total number of messages pushed onto the stack"
    ).expect("metric creation failed");

    /// Messages handed out by pop
    pub static ref MESSAGES_POPPED: Counter = Counter::new(
        "stack_messages_popped_total",
        "Total number of messages popped from the stack"
    ).expect("metric creation failed");

    /// Current tracked store size
    pub static ref STACK_SIZE: Gauge = Gauge::new(
        "stack_store_size",
        "Number of messages currently held by the stack"
    ).expect("metric creation failed");

    /// Time a connection spent blocked on a full or empty store
    pub static ref WAIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "stack_wait_duration_seconds",
            "Time spent blocked waiting for stack capacity or messages"
        ).buckets(exponential_buckets(0.001, 4.0, 10).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // CONNECTION METRICS
    // =========================================================================

    /// Connections currently holding an admission slot
    pub static ref ACTIVE_CONNECTIONS: Gauge = Gauge::new(
        "stack_connections_active",
        "Number of connections currently admitted"
    ).expect("metric creation failed");

    /// Connections answered with the busy byte at admission
    pub static ref CONNECTIONS_REJECTED: Counter = Counter::new(
        "stack_connections_rejected_total",
        "Connections rejected because the connection cap was reached"
    ).expect("metric creation failed");

    /// Stale waiters evicted to admit a new connection
    pub static ref CONNECTIONS_EVICTED: Counter = Counter::new(
        "stack_connections_evicted_total",
        "Waiting connections evicted to make room for new ones"
    ).expect("metric creation failed");

    /// Connections that ended without completing their operation
    pub static ref CONNECTIONS_ABORTED: CounterVec = CounterVec::new(
        Opts::new("stack_connections_aborted_total", "Connections aborted before completion"),
        &["reason"]  // reason: disconnected/shutdown/io
    ).expect("metric creation failed");
}

/// Handle to the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; collectors that are already registered are
/// skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Store
        Box::new(MESSAGES_PUSHED.clone()),
        Box::new(MESSAGES_POPPED.clone()),
        Box::new(STACK_SIZE.clone()),
        Box::new(WAIT_DURATION.clone()),
        // Connections
        Box::new(ACTIVE_CONNECTIONS.clone()),
        Box::new(CONNECTIONS_REJECTED.clone()),
        Box::new(CONNECTIONS_EVICTED.clone()),
        Box::new(CONNECTIONS_ABORTED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
