//! HTTP routes: form submission, dashboard, JSON estimates, health and metrics

use crate::pages::{self, FormValues, Outcome};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use estimator_lib::{
    health::{ComponentStatus, HealthRegistry},
    EstimateError, Estimator, RawFields,
};
use maud::Markup;
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub estimator: Arc<dyn Estimator>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(estimator: Arc<dyn Estimator>, health_registry: HealthRegistry) -> Self {
        Self {
            estimator,
            health_registry,
        }
    }
}

/// Error body returned by `/api/estimate`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ErrorBody {
    /// Body for a request that never reached the estimator
    fn request(rejection: &JsonRejection) -> Self {
        Self {
            error: format!("Invalid request body: {}", rejection.body_text()),
            kind: "request",
            field: None,
        }
    }
}

impl From<&EstimateError> for ErrorBody {
    fn from(err: &EstimateError) -> Self {
        Self {
            error: err.user_message(),
            kind: err.kind(),
            field: err.field(),
        }
    }
}

async fn form() -> Markup {
    pages::form_page(&FormValues::default(), &Outcome::Pending)
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<RawFields>,
) -> (StatusCode, Markup) {
    let result = state.estimator.estimate_fields(&fields);
    state.health_registry.observe_estimate(&result).await;
    let values = FormValues::new(fields);

    match result {
        Ok(estimate) => (
            StatusCode::OK,
            pages::form_page(&values, &Outcome::Succeeded(estimate)),
        ),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            pages::form_page(&values, &Outcome::Failed(err.user_message())),
        ),
    }
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Markup {
    pages::dashboard_page(state.estimator.model_version())
}

/// JSON values become the text an HTML widget would have submitted
fn to_raw_fields(body: Map<String, Value>) -> RawFields {
    body.into_iter()
        .filter_map(|(name, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((name, text))
        })
        .collect()
}

async fn estimate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "Rejected estimate request body"
            );
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody::request(&rejection)),
            )
                .into_response();
        }
    };

    let result = state.estimator.estimate_fields(&to_raw_fields(body));
    state.health_registry.observe_estimate(&result).await;
    match result {
        Ok(estimate) => (StatusCode::OK, Json(estimate)).into_response(),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody::from(&err)),
        )
            .into_response(),
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(form))
        .route("/predict", post(predict))
        .route("/dashboard", get(dashboard))
        .route("/api/estimate", post(estimate))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
