//! Remote tier resolution
//!
//! Registers every remote provider whose credentials are present. Order is
//! Gemini models as configured, then the caption provider.

use super::config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use verdant_core::{DiagnosisProvider, TextGenerator};
use verdant_vision::{CaptionConfig, CaptionProvider, GeminiConfig, GeminiProvider};

/// Remote tiers plus the text generator for translation and Q&A
#[derive(Default)]
pub struct RemoteProviders {
    pub tiers: Vec<Arc<dyn DiagnosisProvider>>,
    pub text: Option<Arc<dyn TextGenerator>>,
}

/// Resolve remote providers from configuration and API keys in the environment
pub fn resolve_remote_providers(config: &AppConfig) -> RemoteProviders {
    let mut resolved = RemoteProviders::default();

    if config.gemini.enabled {
        match GeminiConfig::from_env() {
            Ok(base) => {
                let timeout = Duration::from_secs(config.gemini.timeout_secs);
                for model in &config.gemini.models {
                    let gemini = base.clone().with_model(model).with_timeout(timeout);
                    match GeminiProvider::new(gemini) {
                        Ok(provider) => {
                            let provider = Arc::new(provider);
                            if resolved.text.is_none() {
                                resolved.text = Some(provider.clone());
                            }
                            info!(model = %model, "Registered Gemini tier");
                            resolved.tiers.push(provider);
                        }
                        Err(e) => warn!(model = %model, error = %e, "Failed to create Gemini tier"),
                    }
                }
            }
            Err(e) => warn!("Gemini tiers disabled: {}", e),
        }
    }

    if config.caption.enabled {
        match CaptionConfig::from_env() {
            Ok(caption) => {
                let caption = caption
                    .with_confidence(config.caption.confidence)
                    .with_timeout(Duration::from_secs(config.caption.timeout_secs));
                match CaptionProvider::new(caption) {
                    Ok(provider) => {
                        info!("Registered caption tier");
                        resolved.tiers.push(Arc::new(provider));
                    }
                    Err(e) => warn!(error = %e, "Failed to create caption tier"),
                }
            }
            Err(e) => warn!("Caption tier disabled: {}", e),
        }
    }

    info!(count = resolved.tiers.len(), "Remote tiers resolved");
    resolved
}
