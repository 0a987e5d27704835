//! Prediction service
//!
//! Holds the loaded pipeline and turns records (or raw adapter fields) into
//! formatted estimates. Every fault raised by the pipeline is caught here and
//! returned as a [`PredictionError`]; nothing escapes to the adapters as an
//! unhandled failure.

use crate::error::{EstimateError, Fault, PredictionError};
use crate::models::{Estimate, PropertyRecord};
use crate::observability::{EstimatorMetrics, StructuredLogger};
use crate::predictor::{CurrencyFormatter, Pipeline};
use crate::record::{self, RawFields};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const SLOW_PREDICTION: Duration = Duration::from_millis(50);

/// Lifecycle of a single estimate request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Received,
    Validating,
    Predicting,
    Succeeded,
    Failed,
}

/// Capability every presentation adapter binds to
pub trait Estimator: Send + Sync {
    /// Validate raw fields and estimate the price
    fn estimate_fields(&self, raw: &RawFields) -> Result<Estimate, EstimateError>;

    /// Version of the pipeline producing estimates
    fn model_version(&self) -> &str;
}

/// Load-once, predict-many service around a fitted pipeline
#[derive(Clone)]
pub struct PredictionService {
    pipeline: Arc<dyn Pipeline>,
    formatter: CurrencyFormatter,
    metrics: EstimatorMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    pub fn new(pipeline: Arc<dyn Pipeline>) -> Self {
        Self {
            pipeline,
            formatter: CurrencyFormatter::new(),
            metrics: EstimatorMetrics::new(),
            logger: StructuredLogger::default(),
        }
    }

    pub fn with_formatter(mut self, formatter: CurrencyFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// True when both services run on the same loaded pipeline
    #[cfg(test)]
    fn shares_pipeline_with(&self, other: &PredictionService) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.pipeline) as *const (),
            Arc::as_ptr(&other.pipeline) as *const (),
        )
    }

    /// Estimate the price of a validated record
    pub fn estimate(&self, record: &PropertyRecord) -> Result<Estimate, PredictionError> {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pipeline.predict(std::slice::from_ref(record))
        }));
        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed);

        if elapsed > SLOW_PREDICTION {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "Prediction exceeded latency target");
        }

        let values = match outcome {
            Ok(Ok(values)) => values,
            Ok(Err(e)) => return Err(PredictionError::new(format!("{:#}", e))),
            Err(payload) => {
                return Err(PredictionError::faulted(
                    Fault::Panicked,
                    panic_message(payload.as_ref()),
                ))
            }
        };

        let value = *values
            .first()
            .ok_or_else(|| {
                PredictionError::faulted(Fault::InvalidOutput, "pipeline returned no predictions")
            })?;
        if !value.is_finite() {
            return Err(PredictionError::faulted(
                Fault::InvalidOutput,
                format!("pipeline returned a non-finite prediction ({})", value),
            ));
        }

        let estimate = Estimate {
            estimate: value,
            formatted: self.formatter.format(value),
            model_version: self.pipeline.model_version().to_string(),
        };
        self.logger
            .log_estimate(value, &estimate.formatted, &estimate.model_version, elapsed);
        Ok(estimate)
    }

    fn record_failure(&self, err: &EstimateError) {
        match err {
            EstimateError::Validation(_) => self.metrics.inc_validation_errors(),
            EstimateError::Prediction(_) => self.metrics.inc_prediction_errors(),
        }
        self.logger
            .log_rejected(err.kind(), err.field(), &err.to_string());
    }
}

impl Estimator for PredictionService {
    fn estimate_fields(&self, raw: &RawFields) -> Result<Estimate, EstimateError> {
        let mut state = RequestState::Received;
        debug!(?state, fields = raw.len(), "Estimate request");

        state = RequestState::Validating;
        debug!(?state);
        let result = record::build(raw)
            .map_err(EstimateError::from)
            .and_then(|record| {
                state = RequestState::Predicting;
                debug!(?state);
                self.estimate(&record).map_err(EstimateError::from)
            });

        match &result {
            Ok(_) => {
                state = RequestState::Succeeded;
                self.metrics.inc_estimates();
            }
            Err(err) => {
                state = RequestState::Failed;
                self.record_failure(err);
            }
        }
        debug!(?state, "Estimate request finished");
        result
    }

    fn model_version(&self) -> &str {
        self.pipeline.model_version()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("pipeline panicked: {}", detail)
}
