//! Observability for the estimator
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcome counters, artifact info)
//! - Structured JSON logging of service events with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MetricsInner> = OnceLock::new();

struct MetricsInner {
    prediction_latency_seconds: Histogram,
    estimates_total: IntCounter,
    validation_errors_total: IntCounter,
    prediction_errors_total: IntCounter,
    artifact_info: GaugeVec,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "house_price_prediction_latency_seconds",
                "Time spent running the regression pipeline for one estimate",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            estimates_total: register_int_counter!(
                "house_price_estimates_total",
                "Total number of estimates returned"
            )
            .expect("Failed to register estimates_total"),

            validation_errors_total: register_int_counter!(
                "house_price_validation_errors_total",
                "Total number of requests rejected by input validation"
            )
            .expect("Failed to register validation_errors_total"),

            prediction_errors_total: register_int_counter!(
                "house_price_prediction_errors_total",
                "Total number of faults raised by the pipeline during inference"
            )
            .expect("Failed to register prediction_errors_total"),

            artifact_info: register_gauge_vec!(
                "house_price_artifact_info",
                "Information about the loaded model artifact",
                &["name", "version"]
            )
            .expect("Failed to register artifact_info"),
        }
    }
}

/// Estimator metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct EstimatorMetrics {
    _private: (),
}

impl Default for EstimatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EstimatorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EstimatorMetrics")
    }
}

impl EstimatorMetrics {
    /// Create a metrics handle, registering the metrics on first call
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MetricsInner {
        GLOBAL_METRICS.get_or_init(MetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, elapsed: Duration) {
        self.inner()
            .prediction_latency_seconds
            .observe(elapsed.as_secs_f64());
    }

    pub fn inc_estimates(&self) {
        self.inner().estimates_total.inc();
    }

    pub fn inc_validation_errors(&self) {
        self.inner().validation_errors_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    /// Publish the loaded artifact's identity
    pub fn set_artifact(&self, name: &str, version: &str) {
        self.inner().artifact_info.reset();
        self.inner()
            .artifact_info
            .with_label_values(&[name, version])
            .set(1.0);
    }
}

/// Structured logger for service events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new("house-price")
    }
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, bind_addr: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            bind_addr = %bind_addr,
            "House price estimator started"
        );
    }

    pub fn log_artifact_loaded(&self, path: &str, name: &str, version: &str, fingerprint: &str) {
        info!(
            event = "artifact_loaded",
            instance = %self.instance,
            path = %path,
            artifact = %name,
            model_version = %version,
            fingerprint = %fingerprint,
            "Model artifact ready"
        );
    }

    /// Operator-facing diagnostic for a startup-fatal artifact failure
    pub fn log_artifact_failure(&self, path: &str, reason: &str) {
        error!(
            event = "artifact_load_failed",
            instance = %self.instance,
            path = %path,
            reason = %reason,
            "Model artifact could not be loaded; refusing to serve predictions"
        );
    }

    pub fn log_estimate(&self, value: f64, formatted: &str, model_version: &str, elapsed: Duration) {
        info!(
            event = "estimate_generated",
            instance = %self.instance,
            estimate = value,
            formatted = %formatted,
            model_version = %model_version,
            elapsed_us = elapsed.as_micros() as u64,
            "Generated price estimate"
        );
    }

    pub fn log_rejected(&self, kind: &str, field: Option<&str>, message: &str) {
        warn!(
            event = "estimate_rejected",
            instance = %self.instance,
            kind = %kind,
            field = ?field,
            message = %message,
            "Estimate request failed"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "House price estimator shutting down"
        );
    }
}
