//! Model artifact loader

use crate::config::ModelsConfig;
use crate::feature_normalizer::FeatureNormalizer;
use crate::models::bundle::ModelBundle;
use crate::models::classifier::{Classifier, ClassifierSpec};
use crate::models::scaler::Scaler;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Loader for the classifier, scaler and column artifacts
pub struct ModelLoader {
    /// Directory containing the exported artifacts
    models_dir: PathBuf,
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new loader reading from `models_dir`
    pub fn new<P: AsRef<Path>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.as_ref().to_path_buf(),
            onnx_threads: 1,
        }
    }

    /// Set the number of threads for ONNX inference
    pub fn with_threads(mut self, onnx_threads: usize) -> Self {
        self.onnx_threads = onnx_threads.max(1);
        self
    }

    fn artifact_path(&self, file: &str) -> Result<PathBuf> {
        let path = self.models_dir.join(file);
        if !path.is_file() {
            bail!("Model artifact not found: {}", path.display());
        }
        Ok(path)
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.artifact_path(file)?;
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load the ordered list of trained feature columns
    pub fn load_columns(&self, file: &str) -> Result<Vec<String>> {
        let columns: Vec<String> = self.read_json(file)?;
        info!(file = %file, count = columns.len(), "Model columns loaded");
        Ok(columns)
    }

    /// Load the fitted scaler
    pub fn load_scaler(&self, file: &str) -> Result<Scaler> {
        let scaler: Scaler = self.read_json(file)?;
        info!(file = %file, columns = ?scaler.columns(), "Scaler loaded");
        Ok(scaler)
    }

    /// Load the classifier, checked against the feature vector width.
    ///
    /// `.onnx` files go through ONNX Runtime (cargo feature `onnx`), anything
    /// else is read as a JSON classifier export.
    pub fn load_classifier(&self, file: &str, n_features: usize) -> Result<Box<dyn Classifier>> {
        let path = self.artifact_path(file)?;
        let is_onnx = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"));

        if is_onnx {
            return self.load_onnx(&path);
        }

        let spec: ClassifierSpec = self.read_json(file)?;
        spec.validate(n_features).with_context(|| {
            format!("Classifier {} does not match the model columns", path.display())
        })?;

        let classifier = spec.into_classifier();
        info!(file = %file, kind = classifier.name(), "Classifier loaded");
        Ok(classifier)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let classifier = crate::models::onnx::OnnxClassifier::load(path, self.onnx_threads)?;
        Ok(Box::new(classifier))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        bail!(
            "{} is an ONNX model but this build lacks the `onnx` feature",
            path.display()
        )
    }

    /// Load all three artifacts and assemble the bundle
    pub fn load_bundle(&self, config: &ModelsConfig) -> Result<ModelBundle> {
        info!(
            models_dir = %self.models_dir.display(),
            onnx_threads = self.onnx_threads,
            "Loading model artifacts"
        );

        if !(0.0..=1.0).contains(&config.decision_threshold) {
            bail!(
                "decision_threshold must be within [0, 1], got {}",
                config.decision_threshold
            );
        }

        let columns = self.load_columns(&config.columns_file)?;
        let scaler = self.load_scaler(&config.scaler_file)?;
        let normalizer = FeatureNormalizer::new(columns, scaler)
            .context("Scaler and model columns are inconsistent")?;

        let classifier =
            self.load_classifier(&config.classifier_file, normalizer.feature_count())?;

        let bundle = ModelBundle::new(classifier, normalizer)?
            .with_decision_threshold(config.decision_threshold);
        Ok(bundle)
    }
}
