//! Model bundle components

pub mod bundle;
pub mod classifier;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use bundle::ModelBundle;
pub use classifier::{Classifier, ClassifierSpec};
pub use loader::ModelLoader;
pub use scaler::Scaler;
