//! Application state.
//!
//! One `AppState` behind an Arc: configuration, the collaborator trait
//! objects, clip storage, the transcode pipeline, and the in-process
//! upload-lease registry. Handlers extract `State<Arc<AppState>>` and the
//! services clone the Arcs they need.

use std::sync::Arc;

use voicebank_core::{
    BonusEvaluator, ClipStore, Config, MarketingSync, ProgressEvaluator, SentenceStore,
};
use voicebank_processing::TranscodePipeline;
use voicebank_storage::Storage;

use crate::services::lease::UploadLeases;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub clips: Arc<dyn ClipStore>,
    pub sentences: Arc<dyn SentenceStore>,
    pub storage: Arc<dyn Storage>,
    pub progress: Arc<dyn ProgressEvaluator>,
    pub bonuses: Arc<dyn BonusEvaluator>,
    pub basket: Arc<dyn MarketingSync>,
    pub transcoder: Arc<dyn TranscodePipeline>,
    pub upload_leases: UploadLeases,
}
