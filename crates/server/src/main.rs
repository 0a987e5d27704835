//! House price estimator server
//!
//! Loads the regression pipeline once at startup and serves estimates to
//! the form and dashboard adapters. Refuses to start when the artifact
//! cannot be loaded.

use anyhow::{Context, Result};
use estimator_lib::{
    health::{components, HealthRegistry},
    predictor::CurrencyFormatter,
    Artifact, EstimatorMetrics, PredictionService, StructuredLogger,
};
use house_price_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, level from RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting house-price-server");

    let config = ServerConfig::load()?;
    info!(instance = %config.instance_name, artifact = %config.artifact_path.display(), "Server configured");

    let logger = StructuredLogger::new(&config.instance_name);
    let artifact_path = config.artifact_path.display().to_string();

    // Fail closed: no artifact, no listener
    let artifact = match Artifact::load(&config.artifact_path) {
        Ok(artifact) => artifact,
        Err(e) => {
            logger.log_artifact_failure(&artifact_path, &e.to_string());
            return Err(e).context("Cannot serve predictions without a model artifact");
        }
    };
    logger.log_artifact_loaded(
        &artifact_path,
        artifact.name(),
        artifact.version(),
        artifact.fingerprint(),
    );

    let metrics = EstimatorMetrics::new();
    metrics.set_artifact(artifact.name(), artifact.version());

    let health_registry = HealthRegistry::new();
    health_registry.register(components::ARTIFACT).await;
    health_registry.register(components::ESTIMATOR).await;

    let model_version = artifact.version().to_string();
    let service = PredictionService::new(Arc::new(artifact))
        .with_formatter(CurrencyFormatter::with_symbol(&config.currency_symbol))
        .with_logger(logger.clone());

    let state = Arc::new(api::AppState::new(Arc::new(service), health_registry.clone()));
    health_registry.set_ready(model_version).await;

    let addr = config.listen_addr();
    logger.log_startup(SERVICE_VERSION, &addr);

    let shutdown_logger = logger.clone();
    let shutdown_health = health_registry.clone();
    api::serve(&addr, state, async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            // Stop advertising readiness while in-flight requests drain
            shutdown_health.set_not_ready().await;
            shutdown_logger.log_shutdown("SIGINT received");
        }
    })
    .await?;

    info!("Shut down");
    Ok(())
}
