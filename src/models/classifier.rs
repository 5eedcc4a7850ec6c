//! Binary classifiers that turn a feature vector into a churn probability
//!
//! Native backends are read from a JSON export of the trained model:
//!
//! - `logistic`: linear model with a sigmoid link
//! - `tree_ensemble`: gradient-boosted trees with XGBoost `binary:logistic`
//!   semantics (`sigmoid(logit(base_score) + sum of leaves)`)
//!
//! The ONNX backend lives in `models::onnx` behind the `onnx` feature.

use crate::error::{InferenceError, SchemaError};
use serde::{Deserialize, Serialize};

/// A trained binary classifier.
///
/// Implementations are shared across request handlers and must not need
/// mutable access to predict.
pub trait Classifier: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Number of input features, when the model declares it
    fn feature_count(&self) -> Option<usize>;

    /// Probability of the positive (churn) class
    fn predict_proba(&self, features: &[f32]) -> Result<f64, InferenceError>;
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticClassifier {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }
}

impl Classifier for LogisticClassifier {
    fn name(&self) -> &str {
        "logistic"
    }

    fn feature_count(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict_proba(&self, features: &[f32]) -> Result<f64, InferenceError> {
        if features.len() != self.coefficients.len() {
            return Err(InferenceError::FeatureCount {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, &x)| w * x as f64)
                .sum::<f64>();

        Ok(sigmoid(z))
    }
}

/// One node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        /// Split value, kept in single precision like the features it is compared to
        threshold: f32,
        left: usize,
        right: usize,
        /// Branch taken for NaN inputs (defaults to `left`)
        #[serde(default)]
        missing: Option<usize>,
    },
}

/// Regression tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Leaf value reached by `features`.
    ///
    /// Traversal is bounded by the node count so a cyclic tree fails
    /// instead of looping.
    fn score(&self, features: &[f32]) -> Option<f64> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx)? {
                TreeNode::Leaf { leaf } => return Some(*leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    missing,
                } => {
                    let x = *features.get(*feature)?;
                    idx = if x.is_nan() {
                        missing.unwrap_or(*left)
                    } else if x < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        None
    }

    fn validate(&self, tree: usize, n_features: usize) -> Result<(), SchemaError> {
        let malformed = |reason: String| SchemaError::MalformedTree { tree, reason };

        if self.nodes.is_empty() {
            return Err(malformed("no nodes".to_string()));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                missing,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(malformed(format!(
                        "node {i} splits on feature {feature} of {n_features}"
                    )));
                }
                let children = [Some(*left), Some(*right), *missing];
                let dangling = children
                    .into_iter()
                    .flatten()
                    .find(|&c| c >= self.nodes.len());
                if let Some(child) = dangling {
                    return Err(malformed(format!("node {i} points to missing node {child}")));
                }
            }
        }

        Ok(())
    }
}

/// Gradient-boosted tree ensemble with a logistic objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleClassifier {
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

fn default_base_score() -> f64 {
    0.5
}

impl TreeEnsembleClassifier {
    pub fn new(base_score: f64, trees: Vec<Tree>) -> Self {
        Self { base_score, trees }
    }

    fn base_margin(&self) -> f64 {
        (self.base_score / (1.0 - self.base_score)).ln()
    }
}

impl Classifier for TreeEnsembleClassifier {
    fn name(&self) -> &str {
        "tree_ensemble"
    }

    fn feature_count(&self) -> Option<usize> {
        None
    }

    fn predict_proba(&self, features: &[f32]) -> Result<f64, InferenceError> {
        let mut margin = self.base_margin();
        for (i, tree) in self.trees.iter().enumerate() {
            margin += tree
                .score(features)
                .ok_or(InferenceError::UnterminatedTree(i))?;
        }
        Ok(sigmoid(margin))
    }
}

/// Serialized classifier, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    Logistic(LogisticClassifier),
    TreeEnsemble(TreeEnsembleClassifier),
}

impl ClassifierSpec {
    /// Check the model against the width of the feature vector it will receive
    pub fn validate(&self, n_features: usize) -> Result<(), SchemaError> {
        match self {
            ClassifierSpec::Logistic(model) => {
                if model.coefficients.len() != n_features {
                    return Err(SchemaError::FeatureCount {
                        expected: model.coefficients.len(),
                        actual: n_features,
                    });
                }
                if !model.intercept.is_finite() || model.coefficients.iter().any(|w| !w.is_finite())
                {
                    return Err(SchemaError::Invalid(
                        "logistic parameters must be finite".to_string(),
                    ));
                }
            }
            ClassifierSpec::TreeEnsemble(model) => {
                if !(model.base_score > 0.0 && model.base_score < 1.0) {
                    return Err(SchemaError::Invalid(format!(
                        "base_score must be in (0, 1), got {}",
                        model.base_score
                    )));
                }
                for (i, tree) in model.trees.iter().enumerate() {
                    tree.validate(i, n_features)?;
                }
            }
        }
        Ok(())
    }

    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ClassifierSpec::Logistic(model) => Box::new(model),
            ClassifierSpec::TreeEnsemble(model) => Box::new(model),
        }
    }
}
