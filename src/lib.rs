//! Churn Prediction API Library
//!
//! Serves a pre-trained Telco customer churn classifier over HTTP. Each
//! request carries one customer record, which is aligned to the trained
//! feature schema, scaled, and scored.

pub mod api;
pub mod config;
pub mod error;
pub mod feature_normalizer;
pub mod metrics;
pub mod models;
pub mod types;

pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use feature_normalizer::FeatureNormalizer;
pub use models::ModelBundle;
pub use types::{Prediction, RawRecord};
