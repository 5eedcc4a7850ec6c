//! Model bundle: classifier, scaler and column schema as one immutable unit

use crate::config::ModelsConfig;
use crate::error::{InferenceError, PredictionError, SchemaError};
use crate::feature_normalizer::FeatureNormalizer;
use crate::models::classifier::Classifier;
use crate::models::loader::ModelLoader;
use crate::types::{Prediction, RawRecord};
use anyhow::Result;
use std::fmt;
use tracing::debug;

/// Default probability cut-off for the churn label
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Everything needed to answer a prediction request.
///
/// Loaded once at startup and shared read-only by all handlers.
pub struct ModelBundle {
    classifier: Box<dyn Classifier>,
    normalizer: FeatureNormalizer,
    decision_threshold: f64,
}

impl ModelBundle {
    /// Assemble a bundle, checking the classifier width against the columns
    pub fn new(
        classifier: Box<dyn Classifier>,
        normalizer: FeatureNormalizer,
    ) -> Result<Self, SchemaError> {
        if let Some(expected) = classifier.feature_count() {
            if expected != normalizer.feature_count() {
                return Err(SchemaError::FeatureCount {
                    expected,
                    actual: normalizer.feature_count(),
                });
            }
        }

        Ok(Self {
            classifier,
            normalizer,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
        })
    }

    /// Load the bundle from the artifacts named in the configuration
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        ModelLoader::new(&config.models_dir)
            .with_threads(config.onnx_threads)
            .load_bundle(config)
    }

    pub fn with_decision_threshold(mut self, threshold: f64) -> Self {
        self.decision_threshold = threshold;
        self
    }

    /// Normalize a record and run the classifier on it
    pub fn predict(&self, record: &RawRecord) -> Result<Prediction, PredictionError> {
        let features = self.normalizer.normalize(record)?;
        let probability = self.classifier.predict_proba(features.as_slice())?;

        if !probability.is_finite() {
            return Err(InferenceError::InvalidProbability(probability).into());
        }

        let prediction = Prediction::from_probability(probability, self.decision_threshold);
        debug!(
            classifier = self.classifier.name(),
            prediction = prediction.prediction,
            probability = prediction.probability,
            "Inference complete"
        );

        Ok(prediction)
    }

    pub fn normalizer(&self) -> &FeatureNormalizer {
        &self.normalizer
    }

    pub fn feature_count(&self) -> usize {
        self.normalizer.feature_count()
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }
}

impl fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBundle")
            .field("classifier", &self.classifier.name())
            .field("features", &self.normalizer.feature_count())
            .field("decision_threshold", &self.decision_threshold)
            .finish()
    }
}
