//! `verdant diagnose <image>`

use crate::server::{build_diagnosis_stack, init_database, load_config};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;
use verdant_core::{ImageInput, NoReferenceData, ReferenceLookup};
use verdant_store::ReferenceStore;

pub async fn run(image_path: &Path, language: Option<&str>) -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;

    let bytes = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("Failed to read {}", image_path.display()))?;
    let filename = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    // reference data is optional here
    let reference: Arc<dyn ReferenceLookup> = match init_database(&config).await {
        Ok(database) => Arc::new(ReferenceStore::new(database.pool().clone())),
        Err(e) => {
            warn!("Reference data unavailable: {:#}", e);
            Arc::new(NoReferenceData)
        }
    };

    let stack = build_diagnosis_stack(&config, reference).await;
    let image = ImageInput::new(bytes, filename);
    let language = language.unwrap_or(&config.translation.default_language);

    let report = stack.pipeline.diagnose_report_in(&image, language).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
