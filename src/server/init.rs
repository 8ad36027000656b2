//! Service construction and the HTTP run loop

use super::config::AppConfig;
use super::loader::load_config;
use super::providers::resolve_remote_providers;
use crate::api::{app_router, AppState};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use verdant_core::{
    DiagnosisPipeline, LocalTier, ReferenceLookup, TextGenerator, Translator,
};
use verdant_store::{seed_reference_data, Database, GardenStore, ReferenceStore, UserStore};
use verdant_vision::{ClassifierConfig, OnnxClassifier};

/// Everything needed to diagnose an image
pub struct DiagnosisStack {
    pub pipeline: DiagnosisPipeline,
    pub classifier: Arc<OnnxClassifier>,
    pub text: Option<Arc<dyn TextGenerator>>,
}

/// Open the database, create the schema and seed it if configured
pub async fn init_database(config: &AppConfig) -> Result<Database> {
    if let Some(path) = config.database.url.strip_prefix("sqlite://") {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
    }

    let database = Database::connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    database
        .init()
        .await
        .context("Failed to create database schema")?;

    if config.database.seed {
        seed_reference_data(database.pool())
            .await
            .context("Failed to seed reference data")?;
    }
    Ok(database)
}

/// Build the classifier, remote tiers and translator in tier order
pub async fn build_diagnosis_stack(
    config: &AppConfig,
    reference: Arc<dyn ReferenceLookup>,
) -> DiagnosisStack {
    let classifier_config = ClassifierConfig::new(
        &config.classifier.model_path,
        &config.classifier.class_indices_path,
    )
    .with_threshold(config.classifier.threshold)
    .with_input_size(config.classifier.input_size);
    let classifier = Arc::new(OnnxClassifier::new(classifier_config));

    if !classifier.warm_up().await {
        warn!(
            model = %config.classifier.model_path,
            "Local model unavailable, every request will escalate to remote tiers"
        );
    }

    let local = LocalTier::new(classifier.clone()).with_reference(reference);
    let remote = resolve_remote_providers(config);

    let mut pipeline = DiagnosisPipeline::new()
        .with_tier_timeout(Duration::from_secs(config.pipeline.tier_timeout_secs))
        .with_tier(Arc::new(local));
    for tier in remote.tiers {
        pipeline = pipeline.with_tier(tier);
    }
    if let Some(text) = &remote.text {
        pipeline = pipeline.with_translator(
            Translator::new(text.clone())
                .with_default_language(&config.translation.default_language),
        );
    }

    info!(tiers = ?pipeline.tier_names(), "Diagnosis pipeline ready");
    DiagnosisStack {
        pipeline,
        classifier,
        text: remote.text,
    }
}

/// Run the server
pub async fn run() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    let database = init_database(&config).await?;
    let reference = Arc::new(ReferenceStore::new(database.pool().clone()));
    let stack = build_diagnosis_stack(&config, reference).await;

    let state = AppState {
        pipeline: Arc::new(stack.pipeline),
        classifier: stack.classifier,
        assistant: stack.text,
        users: UserStore::new(database.pool().clone()),
        garden: GardenStore::new(database.pool().clone()),
        uploads_dir: PathBuf::from(&config.uploads.dir),
        default_language: config.translation.default_language.clone(),
    };
    tokio::fs::create_dir_all(&state.uploads_dir)
        .await
        .with_context(|| format!("Failed to create {}", state.uploads_dir.display()))?;

    let app = app_router(state, config.server.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
