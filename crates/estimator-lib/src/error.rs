//! Error taxonomy for artifact loading, input validation and inference

use std::path::PathBuf;
use thiserror::Error;

/// Startup-fatal errors raised while loading the model artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("model artifact at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl ArtifactError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Why a raw field was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("field is required")]
    Missing,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),

    #[error("must be {0}")]
    OutOfRange(&'static str),
}

/// A single input field could not be coerced into the record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for '{field}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

/// Pipeline misbehaviour, as opposed to a record the pipeline refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The pipeline panicked
    Panicked,
    /// The pipeline returned no value or a non-finite one
    InvalidOutput,
}

/// The artifact raised a fault during inference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("prediction failed: {cause}")]
pub struct PredictionError {
    pub cause: String,
    pub fault: Option<Fault>,
}

impl PredictionError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            fault: None,
        }
    }

    pub fn faulted(fault: Fault, cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            fault: Some(fault),
        }
    }
}

/// Request-scoped failure of a full estimate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl EstimateError {
    /// Short machine-readable kind, used by the JSON API
    pub fn kind(&self) -> &'static str {
        match self {
            EstimateError::Validation(_) => "validation",
            EstimateError::Prediction(_) => "prediction",
        }
    }

    /// Offending field for validation failures
    pub fn field(&self) -> Option<&'static str> {
        match self {
            EstimateError::Validation(e) => Some(e.field),
            EstimateError::Prediction(_) => None,
        }
    }

    /// Pipeline fault behind a prediction failure, if any
    pub fn fault(&self) -> Option<Fault> {
        match self {
            EstimateError::Validation(_) => None,
            EstimateError::Prediction(e) => e.fault,
        }
    }

    /// Message suitable for display next to the input form
    pub fn user_message(&self) -> String {
        match self {
            EstimateError::Validation(e) => {
                format!("Please check your inputs. {}", e)
            }
            EstimateError::Prediction(e) => format!(
                "An error occurred during prediction. Please check your inputs. Error: {}",
                e.cause
            ),
        }
    }
}
