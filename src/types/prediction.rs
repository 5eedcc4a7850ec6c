//! Response payloads for the prediction endpoint

use serde::{Deserialize, Serialize};

/// Churn prediction for a single customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted label (1 = churn, 0 = stay)
    pub prediction: u8,
    /// Probability of the churn class (0.0 - 1.0)
    pub probability: f64,
}

impl Prediction {
    /// Build a prediction from a churn probability and decision threshold
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        Self {
            prediction: u8::from(probability > threshold),
            probability,
        }
    }

    pub fn is_churn(&self) -> bool {
        self.prediction == 1
    }
}

/// Error payload returned on any per-request failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_threshold() {
        assert_eq!(Prediction::from_probability(0.49, 0.5).prediction, 0);
        assert_eq!(Prediction::from_probability(0.5, 0.5).prediction, 0);
        assert_eq!(Prediction::from_probability(0.500_001, 0.5).prediction, 1);
        assert!(Prediction::from_probability(0.91, 0.5).is_churn());
    }

    #[test]
    fn test_probability_is_clamped() {
        assert_eq!(Prediction::from_probability(1.2, 0.5).probability, 1.0);
        assert_eq!(Prediction::from_probability(-0.1, 0.5).probability, 0.0);
    }

    #[test]
    fn test_prediction_serialization() {
        let json = serde_json::to_value(Prediction::from_probability(0.75, 0.5)).unwrap();
        assert_eq!(json, serde_json::json!({"prediction": 1, "probability": 0.75}));
    }
}
