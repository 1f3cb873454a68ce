//! Application setup and initialization
//!
//! All initialization logic lives here instead of main.rs: telemetry,
//! database pool, clip storage, the collaborator wiring, and routes.

pub mod database;
pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use std::sync::Arc;

use voicebank_core::Config;
use voicebank_db::{AwardsRepository, ChallengeRepository, ClipRepository, SentenceRepository};
use voicebank_processing::FfmpegTranscoder;
use voicebank_storage::{LocalStorage, Storage};

use crate::services::basket::BasketClient;
use crate::services::lease::UploadLeases;
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(&config.environment);
    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            config.clips_storage_path.clone(),
            config.clips_public_url.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize clip storage: {}", e))?,
    );

    let state = Arc::new(AppState {
        clips: Arc::new(ClipRepository::new(pool.clone())),
        sentences: Arc::new(SentenceRepository::new(pool.clone())),
        storage,
        progress: Arc::new(AwardsRepository::new(pool.clone())),
        bonuses: Arc::new(ChallengeRepository::new(pool)),
        basket: Arc::new(BasketClient::new(config.basket_sync_url.clone())),
        transcoder: Arc::new(FfmpegTranscoder::new(config.ffmpeg_path.clone())),
        upload_leases: UploadLeases::new(),
        config,
    });

    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
