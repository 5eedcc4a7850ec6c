//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::types::ErrorResponse;

pub type ApiResult<T> = Result<T, ApiError>;

/// Inconsistencies between the model artifacts, detected at startup
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("model column list is empty")]
    EmptyColumns,

    #[error("duplicate model column `{0}`")]
    DuplicateColumn(String),

    #[error("column `{0}` is required but missing from the model columns")]
    MissingColumn(String),

    #[error("scaler has {columns} columns but {params} `{name}` parameters")]
    ScalerShape {
        name: &'static str,
        columns: usize,
        params: usize,
    },

    #[error("scaler parameter `{0}` is not finite")]
    ScalerNotFinite(&'static str),

    #[error("classifier expects {expected} features but the model columns define {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("tree {tree}: {reason}")]
    MalformedTree { tree: usize, reason: String },

    #[error("{0}")]
    Invalid(String),
}

/// Failure to turn a record into a feature vector
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("field `{field}` holds an unsupported {kind} value")]
    UnsupportedValue { field: String, kind: &'static str },

    #[error("column `{0}` is produced by more than one field")]
    DuplicateColumn(String),
}

/// Failure inside the classifier
#[derive(Debug, Error, PartialEq)]
pub enum InferenceError {
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("classifier returned an invalid probability ({0})")]
    InvalidProbability(f64),

    #[error("tree {0} did not reach a leaf")]
    UnterminatedTree(usize),

    #[error("inference backend failed: {0}")]
    Backend(String),
}

/// Any failure between receiving a record and producing a prediction
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        tracing::error!(error = %message, "Prediction request failed");

        let body = Json(ErrorResponse { error: message });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
