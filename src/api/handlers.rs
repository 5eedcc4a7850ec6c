//! Route handlers

use axum::{body::Bytes, extract::State, Json};
use std::time::Instant;
use tracing::{debug, info_span};
use uuid::Uuid;

use super::AppState;
use crate::error::{ApiError, ApiResult};
use crate::types::{Prediction, RawRecord};

/// Body returned by the liveness route
pub const LIVENESS_MESSAGE: &str = "Telco Churn Prediction API is running!";

/// Liveness check
pub async fn home() -> &'static str {
    LIVENESS_MESSAGE
}

/// Predict churn for one customer record.
///
/// The body is read as raw bytes so that a missing or wrong `Content-Type`
/// and malformed JSON all end up in the same `{error}` response.
pub async fn predict(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Prediction>> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);
    let start = Instant::now();

    let result = span.in_scope(|| -> ApiResult<Prediction> {
        let record: RawRecord = serde_json::from_slice(&body)?;
        debug!(fields = record.len(), "Record received");
        state.bundle.predict(&record).map_err(ApiError::from)
    });

    let latency = start.elapsed();
    match result {
        Ok(prediction) => {
            state.metrics.record_prediction(latency, &prediction);
            span.in_scope(|| {
                debug!(
                    prediction = prediction.prediction,
                    probability = prediction.probability,
                    latency_us = latency.as_micros() as u64,
                    "Prediction served"
                )
            });
            Ok(Json(prediction))
        }
        Err(e) => {
            state.metrics.record_failure(latency);
            Err(e)
        }
    }
}
