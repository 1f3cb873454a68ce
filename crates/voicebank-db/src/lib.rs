//! Database repositories for data access layer
//!
//! sqlx/MySQL implementations of the collaborator traits defined in
//! `voicebank-core`: clip persistence and eligibility, sentence lookups,
//! and the thin engagement stand-ins (achievements/goals, challenge
//! bonuses). Each repository owns a pool handle and is cheap to clone.

pub mod db;

pub use db::clip::ClipRepository;
pub use db::engagement::{AwardsRepository, ChallengeRepository};
pub use db::sentence::SentenceRepository;
