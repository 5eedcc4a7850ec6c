//! HTTP surface of the prediction service

pub mod handlers;

use crate::metrics::ServiceMetrics;
use crate::models::ModelBundle;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub bundle: Arc<ModelBundle>,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(bundle: Arc<ModelBundle>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { bundle, metrics }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/predict", post(handlers::predict))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
