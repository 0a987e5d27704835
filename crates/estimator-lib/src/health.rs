//! Health tracking for the estimator service
//!
//! Backs the `/healthz` and `/readyz` endpoints. The server registers the
//! artifact and estimator components at startup and flips readiness once
//! the artifact has been loaded. Every estimate served by an adapter then
//! updates the estimator component: a panicking pipeline marks it
//! unhealthy, an invalid output marks it degraded, and the next success
//! restores it.

use crate::error::{EstimateError, Fault};
use crate::models::Estimate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Operational, but something needs attention
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

/// Last reported state of a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Body of `/healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status wins
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|c| c.status)
            .max_by_key(|status| match status {
                ComponentStatus::Healthy => 0,
                ComponentStatus::Degraded => 1,
                ComponentStatus::Unhealthy => 2,
            })
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Body of `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const ARTIFACT: &str = "artifact";
    pub const ESTIMATOR: &str = "estimator";
}

#[derive(Debug, Default)]
struct Readiness {
    ready: bool,
    model_version: Option<String>,
}

/// Shared registry of component health and service readiness
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    readiness: Arc<RwLock<Readiness>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component as healthy
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        self.components
            .write()
            .await
            .insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Mark the service ready to serve estimates from `model_version`
    pub async fn set_ready(&self, model_version: impl Into<String>) {
        let mut readiness = self.readiness.write().await;
        readiness.ready = true;
        readiness.model_version = Some(model_version.into());
    }

    pub async fn set_not_ready(&self) {
        *self.readiness.write().await = Readiness::default();
    }

    /// Track estimator health from the outcome of one estimate
    ///
    /// Rejected records say nothing about the pipeline and leave it as is.
    pub async fn observe_estimate(&self, result: &Result<Estimate, EstimateError>) {
        let err = match result {
            Ok(_) => return self.set_healthy(components::ESTIMATOR).await,
            Err(err) => err,
        };
        match err.fault() {
            Some(Fault::Panicked) => {
                self.set_unhealthy(components::ESTIMATOR, err.to_string())
                    .await
            }
            Some(Fault::InvalidOutput) => {
                self.set_degraded(components::ESTIMATOR, err.to_string())
                    .await
            }
            None => {}
        }
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let (ready, model_version) = {
            let readiness = self.readiness.read().await;
            (readiness.ready, readiness.model_version.clone())
        };
        let health = self.health().await;

        if !ready {
            ReadinessResponse {
                ready: false,
                reason: Some("Model artifact not loaded".to_string()),
                model_version: None,
            }
        } else if !health.status.is_operational() {
            ReadinessResponse {
                ready: false,
                reason: Some("Critical component unhealthy".to_string()),
                model_version,
            }
        } else {
            ReadinessResponse {
                ready: true,
                reason: None,
                model_version,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry_is_healthy() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_worst_component_wins() {
        let registry = HealthRegistry::new();
        registry.register(components::ARTIFACT).await;
        registry.register(components::ESTIMATOR).await;

        registry
            .set_degraded(components::ESTIMATOR, "High prediction error rate")
            .await;
        assert_eq!(registry.health().await.status, ComponentStatus::Degraded);

        registry
            .set_unhealthy(components::ARTIFACT, "Artifact missing")
            .await;
        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);

        registry.set_healthy(components::ARTIFACT).await;
        registry.set_healthy(components::ESTIMATOR).await;
        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_not_ready_until_artifact_loaded() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());

        registry.set_ready("1.0.0").await;
        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert_eq!(readiness.model_version.as_deref(), Some("1.0.0"));

        registry.set_not_ready().await;
        assert!(!registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_estimate_outcomes_drive_estimator_health() {
        use crate::error::{PredictionError, ValidationError, ValidationReason};

        let registry = HealthRegistry::new();
        registry.register(components::ESTIMATOR).await;
        registry.set_ready("1.0.0").await;

        let estimator_status = |health: HealthResponse| health.components[components::ESTIMATOR].status;

        let rejected: Result<Estimate, EstimateError> =
            Err(ValidationError::new("area", ValidationReason::Missing).into());
        registry.observe_estimate(&rejected).await;
        let unknown_category: Result<Estimate, EstimateError> =
            Err(PredictionError::new("Found unknown categories ['luxury']").into());
        registry.observe_estimate(&unknown_category).await;
        assert_eq!(estimator_status(registry.health().await), ComponentStatus::Healthy);

        let bad_output: Result<Estimate, EstimateError> = Err(PredictionError::faulted(
            Fault::InvalidOutput,
            "pipeline returned a non-finite prediction (NaN)",
        )
        .into());
        registry.observe_estimate(&bad_output).await;
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert!(health.components[components::ESTIMATOR]
            .message
            .as_deref()
            .unwrap()
            .contains("non-finite"));
        assert!(registry.readiness().await.ready);

        let panicked: Result<Estimate, EstimateError> =
            Err(PredictionError::faulted(Fault::Panicked, "pipeline panicked: boom").into());
        registry.observe_estimate(&panicked).await;
        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);
        assert!(!registry.readiness().await.ready);

        let served: Result<Estimate, EstimateError> = Ok(Estimate {
            estimate: 5_333_333.3,
            formatted: "₹ 5,333,333".to_string(),
            model_version: "1.0.0".to_string(),
        });
        registry.observe_estimate(&served).await;
        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_not_ready_when_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register(components::ARTIFACT).await;
        registry.set_ready("1.0.0").await;
        registry.set_unhealthy(components::ARTIFACT, "Failed").await;

        assert!(!registry.readiness().await.ready);
    }
}
