//! Server configuration types

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub caption: CaptionSettings,
    #[serde(default)]
    pub translation: TranslationSettings,
    #[serde(default)]
    pub uploads: UploadSettings,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Insert reference data on start-up when the store is empty
    #[serde(default = "default_true")]
    pub seed: bool,
}

fn default_database_url() -> String {
    "sqlite://data/verdant.db".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            seed: true,
        }
    }
}

/// Local model artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_class_indices_path")]
    pub class_indices_path: String,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
}

fn default_model_path() -> String {
    "models/plant_disease_model.onnx".to_string()
}

fn default_class_indices_path() -> String {
    "models/class_indices.json".to_string()
}

fn default_threshold() -> f32 {
    verdant_core::DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_input_size() -> u32 {
    verdant_vision::classifier::INPUT_SIZE
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            class_indices_path: default_class_indices_path(),
            threshold: default_threshold(),
            input_size: default_input_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_tier_timeout_secs")]
    pub tier_timeout_secs: u64,
}

fn default_tier_timeout_secs() -> u64 {
    20
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tier_timeout_secs: default_tier_timeout_secs(),
        }
    }
}

/// Gemini tiers (the key comes from the environment)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_gemini_models")]
    pub models: Vec<String>,
    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gemini_models() -> Vec<String> {
    vec![
        verdant_vision::gemini::DEFAULT_MODEL.to_string(),
        verdant_vision::gemini::LITE_MODEL.to_string(),
    ]
}

fn default_gemini_timeout_secs() -> u64 {
    15
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            models: default_gemini_models(),
            timeout_secs: default_gemini_timeout_secs(),
        }
    }
}

/// Caption-only tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_caption_confidence")]
    pub confidence: f32,
    #[serde(default = "default_caption_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_caption_confidence() -> f32 {
    verdant_vision::huggingface::DEFAULT_CAPTION_CONFIDENCE
}

fn default_caption_timeout_secs() -> u64 {
    20
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence: default_caption_confidence(),
            timeout_secs: default_caption_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSettings {
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_language() -> String {
    verdant_core::translate::DEFAULT_LANGUAGE.to_string()
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            default_language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_uploads_dir")]
    pub dir: String,
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: default_uploads_dir(),
        }
    }
}
