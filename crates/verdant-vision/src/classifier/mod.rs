//! Local image classifier
//!
//! Decodes an upload, resizes it to the model input, runs one forward pass
//! and reports the top class through the `verdant-core` threshold policy.

mod labels;
mod onnx;
mod preprocess;


pub use labels::{load_class_indices, parse_class_indices};
pub use onnx::OnnxClassifier;
pub use preprocess::{preprocess, INPUT_SIZE};

use std::path::PathBuf;
use verdant_core::DEFAULT_CONFIDENCE_THRESHOLD;

/// Classifier artifacts and policy
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Exported ONNX model
    pub model_path: PathBuf,
    /// `{label: index}` JSON file
    pub class_indices_path: PathBuf,
    /// Below this confidence the label becomes `Unknown`
    pub threshold: f32,
    /// Square input side length
    pub input_size: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/plant_disease_model.onnx"),
            class_indices_path: PathBuf::from("models/class_indices.json"),
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            input_size: INPUT_SIZE,
        }
    }
}

impl ClassifierConfig {
    /// Config for the given artifact paths
    #[must_use]
    pub fn new(model_path: impl Into<PathBuf>, class_indices_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            class_indices_path: class_indices_path.into(),
            ..Self::default()
        }
    }

    /// Set the confidence threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the square input side length
    #[must_use]
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }
}
