//! Churn Prediction API - Main Entry Point
//!
//! Loads the model artifacts once, then serves `GET /` and `POST /predict`.

use anyhow::{Context, Result};
use churn_prediction_api::{
    api::{create_router, AppState},
    config::{AppConfig, LogFormat, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    models::ModelBundle,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_tracing(&config.logging)?;

    info!("Starting Churn Prediction API");
    info!(
        models_dir = %config.models.models_dir,
        classifier = %config.models.classifier_file,
        decision_threshold = config.models.decision_threshold,
        "Configuration loaded"
    );

    // A partially loaded model must never serve requests
    let bundle = match ModelBundle::load(&config.models) {
        Ok(bundle) => bundle,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to load model artifacts");
            error!("Please ensure the artifacts exist in '{}'", config.models.models_dir);
            std::process::exit(1);
        }
    };
    info!(
        classifier = bundle.classifier_name(),
        features = bundle.feature_count(),
        "Model, scaler and columns loaded successfully"
    );

    let metrics = Arc::new(ServiceMetrics::new());

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState::new(Arc::new(bundle), metrics.clone());
    let app = create_router(state);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!(
            "churn_prediction_api={level},tower_http={level}",
            level = logging.level
        ))
        .context("Invalid logging level")?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
