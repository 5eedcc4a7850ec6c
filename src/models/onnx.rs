//! ONNX Runtime classifier backend

use crate::error::InferenceError;
use crate::models::classifier::Classifier;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Classifier exported to ONNX (e.g. via `onnxmltools` or `skl2onnx`)
pub struct OnnxClassifier {
    name: String,
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load an ONNX model from file
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        ort::init().commit()?;
        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    fn run(&self, features: &[f32]) -> Result<f64> {
        // shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        self.extract_probability(&outputs)
    }

    /// Extract the churn probability from the model output.
    ///
    /// Handles tensor outputs (`[batch, classes]`) as well as the
    /// `seq(map(int64, float))` outputs produced by tree model converters.
    fn extract_probability(&self, outputs: &SessionOutputs) -> Result<f64> {
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Some(prob) = self.extract_from_value(output) {
                return Ok(prob);
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(prob) = self.extract_from_value(&output) {
                debug!(
                    model = %self.name,
                    output = %name,
                    prob = prob,
                    "Extracted from fallback output"
                );
                return Ok(prob);
            }
        }

        warn!(model = %self.name, "Could not extract probability from model outputs");
        Err(anyhow::anyhow!("No probability output found"))
    }

    fn extract_from_value(&self, output: &DynValue) -> Option<f64> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return positive_class_from_tensor(&dims, data);
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return self.extract_from_sequence_map(output).ok();
        }

        None
    }

    /// Extract probability from seq(map(int64, float)) format
    fn extract_from_sequence_map(&self, output: &DynValue) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        let map_value = maps
            .first()
            .ok_or_else(|| anyhow::anyhow!("Empty sequence"))?;

        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
            return Ok(*prob as f64);
        }
        if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
            return Ok(1.0 - *prob as f64);
        }

        Err(anyhow::anyhow!("No probability found in map"))
    }
}

/// Pick the positive-class probability out of a probability tensor
fn positive_class_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = dims.last().copied().unwrap_or(0);
    match (dims.len(), classes) {
        (1 | 2, n) if n >= 2 => data.get(1).map(|&p| p as f64),
        (1 | 2, 1) => data.first().map(|&p| p as f64),
        _ => data.last().map(|&p| p as f64),
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> Option<usize> {
        None
    }

    fn predict_proba(&self, features: &[f32]) -> Result<f64, InferenceError> {
        self.run(features)
            .map_err(|e| InferenceError::Backend(format!("{e:#}")))
    }
}
