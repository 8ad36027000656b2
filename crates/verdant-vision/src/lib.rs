//! Verdant Vision - Diagnosis providers
//!
//! Concrete implementations of the `verdant-core` seams:
//! - `classifier`: local ONNX image classifier (tract)
//! - `gemini`: Google Gemini vision provider, also used for translation and Q&A
//! - `huggingface`: caption-only secondary provider

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod error;
pub mod gemini;
pub mod huggingface;
pub mod util;

pub use classifier::{ClassifierConfig, OnnxClassifier};
pub use error::{Error, Result};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use huggingface::{CaptionConfig, CaptionProvider};
