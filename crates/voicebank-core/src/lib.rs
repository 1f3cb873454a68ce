//! Voicebank Core Library
//!
//! Shared foundation for the voicebank services: configuration, the error
//! taxonomy, domain models, challenge-campaign tokens, and the collaborator
//! traits consumed by the ingestion orchestrator and the clip sampler.

pub mod challenge;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod traits;

pub use challenge::{BonusKind, ChallengeToken};
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use traits::{BonusEvaluator, ClipStore, MarketingSync, ProgressEvaluator, SentenceStore};
