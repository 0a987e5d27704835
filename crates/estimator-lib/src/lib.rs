//! House price estimation library
//!
//! This crate provides the core functionality for:
//! - Loading the pre-trained regression pipeline artifact
//! - Building typed property records from raw form fields
//! - Running the pipeline and formatting currency estimates
//! - Health checks and observability

pub mod artifact;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod record;
pub mod service;

pub use artifact::{Artifact, PipelineManifest, RegressorSpec};
pub use error::{
    ArtifactError, EstimateError, Fault, PredictionError, ValidationError, ValidationReason,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{EstimatorMetrics, StructuredLogger};
pub use record::RawFields;
pub use service::{Estimator, PredictionService, RequestState};
