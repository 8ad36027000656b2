//! ONNX classifier adapter
//!
//! With the `onnx` feature the exported model runs through tract-onnx.
//! Without it every prediction reports "model not loaded", so the pipeline
//! always escalates to the remote tiers.

use super::labels::load_class_indices;
use super::preprocess::preprocess;
use super::ClassifierConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use verdant_core::prediction::{ERROR_LABEL, MODEL_NOT_LOADED_LABEL, PREDICTION_FAILED_LABEL};
use verdant_core::{Classifier, ClassifierPrediction};

#[cfg(feature = "onnx")]
use tract_onnx::prelude::*;

#[cfg(feature = "onnx")]
type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Model plan plus labels, shared read-only across requests
struct LoadedModel {
    #[cfg(feature = "onnx")]
    plan: OnnxPlan,
    labels: Vec<String>,
}

impl LoadedModel {
    #[cfg(feature = "onnx")]
    fn load(config: &ClassifierConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(Error::Model(format!(
                "model file not found at {}",
                config.model_path.display()
            )));
        }
        let labels = load_class_indices(&config.class_indices_path)?;

        let size = i64::from(config.input_size);
        let plan = tract_onnx::onnx()
            .model_for_path(&config.model_path)
            .map_err(|e| Error::Model(format!("failed to load model: {e}")))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec![1, size, size, 3]),
            )
            .map_err(|e| Error::Model(format!("input fact error: {e}")))?
            .into_optimized()
            .map_err(|e| Error::Model(format!("model optimize error: {e}")))?
            .into_runnable()
            .map_err(|e| Error::Model(format!("model runnable error: {e}")))?;

        info!(
            model = %config.model_path.display(),
            classes = labels.len(),
            "Classifier model loaded"
        );
        Ok(Self { plan, labels })
    }

    #[cfg(not(feature = "onnx"))]
    fn load(_config: &ClassifierConfig) -> Result<Self> {
        Err(Error::Model(
            "built without the `onnx` feature".to_string(),
        ))
    }

    #[cfg(feature = "onnx")]
    fn infer(&self, input: Vec<f32>, size: u32) -> Result<Vec<f32>> {
        let side = size as usize;
        let tensor: Tensor = tract_ndarray::Array4::from_shape_vec((1, side, side, 3), input)
            .map_err(|e| Error::Model(format!("input tensor error: {e}")))?
            .into();

        let outputs = self
            .plan
            .run(tvec![tensor.into()])
            .map_err(|e| Error::Model(format!("inference error: {e}")))?;
        let scores = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| Error::Model(format!("output parse error: {e}")))?;

        Ok(scores.iter().copied().collect())
    }

    #[cfg(not(feature = "onnx"))]
    fn infer(&self, _input: Vec<f32>, _size: u32) -> Result<Vec<f32>> {
        Err(Error::Model("built without the `onnx` feature".to_string()))
    }
}

/// Turn an inference outcome into a prediction.
///
/// Undecodable uploads report [`ERROR_LABEL`]; any other failure, including an
/// aborted inference task, reports [`PREDICTION_FAILED_LABEL`].
pub(crate) fn to_prediction(
    outcome: Result<Vec<f32>>,
    labels: &[String],
    threshold: f32,
) -> ClassifierPrediction {
    match outcome {
        Ok(scores) => {
            ClassifierPrediction::from_scores(&to_probabilities(scores), labels, threshold)
        }
        Err(Error::Image(e)) => {
            warn!(error = %e, "Uploaded image could not be decoded");
            ClassifierPrediction::error(ERROR_LABEL)
        }
        Err(e) => {
            warn!(error = %e, "Local inference failed");
            ClassifierPrediction::error(PREDICTION_FAILED_LABEL)
        }
    }
}

/// Softmax raw logits; pass through outputs that already are a distribution
pub(crate) fn to_probabilities(scores: Vec<f32>) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let is_distribution =
        scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    if is_distribution || scores.is_empty() {
        return scores;
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Local classifier backed by an exported ONNX model
pub struct OnnxClassifier {
    config: ClassifierConfig,
    model: OnceCell<Arc<LoadedModel>>,
    /// In-flight load, kept across cancelled callers
    loading: Mutex<Option<JoinHandle<Result<LoadedModel>>>>,
}

impl OnnxClassifier {
    /// Create a classifier; artifacts are loaded on first use
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            model: OnceCell::new(),
            loading: Mutex::new(None),
        }
    }

    /// Classifier configuration
    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Load artifacts now instead of on the first request
    pub async fn warm_up(&self) -> bool {
        match self.model().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Classifier not ready, requests will escalate");
                false
            }
        }
    }

    /// Load once; a failed load leaves the cell empty so the next call retries.
    ///
    /// A caller cancelled mid-load leaves the blocking task in `loading`, and
    /// the next caller awaits that task instead of starting another load.
    async fn model(&self) -> Result<Arc<LoadedModel>> {
        self.model
            .get_or_try_init(|| async {
                let mut loading = self.loading.lock().await;
                let outcome = loading
                    .get_or_insert_with(|| {
                        let config = self.config.clone();
                        tokio::task::spawn_blocking(move || LoadedModel::load(&config))
                    })
                    .await;
                *loading = None;
                outcome
                    .map_err(|e| Error::Model(format!("model loader panicked: {e}")))?
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    /// Whether a load task is still pending
    #[cfg(test)]
    pub(crate) async fn load_pending(&self) -> bool {
        self.loading.lock().await.is_some()
    }

    /// Classify raw image bytes
    pub async fn classify(&self, bytes: &[u8]) -> ClassifierPrediction {
        let model = match self.model().await {
            Ok(model) => model,
            Err(e) => {
                warn!(error = %e, "Classifier model unavailable");
                return ClassifierPrediction::error(MODEL_NOT_LOADED_LABEL);
            }
        };

        let size = self.config.input_size;
        let bytes = bytes.to_vec();
        let shared = Arc::clone(&model);
        let outcome = tokio::task::spawn_blocking(move || {
            let input = preprocess(&bytes, size)?;
            shared.infer(input, size)
        })
        .await
        .unwrap_or_else(|e| Err(Error::Model(format!("inference task aborted: {e}"))));

        to_prediction(outcome, &model.labels, self.config.threshold)
    }
}

#[async_trait]
impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "local-classifier"
    }

    async fn predict(&self, image: &[u8]) -> ClassifierPrediction {
        self.classify(image).await
    }

    fn is_loaded(&self) -> bool {
        self.model.initialized()
    }
}
