//! Type definitions for the churn prediction API

pub mod prediction;
pub mod record;

pub use prediction::{ErrorResponse, Prediction};
pub use record::{FeatureVector, RawRecord};
