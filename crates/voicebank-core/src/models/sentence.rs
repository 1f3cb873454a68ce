use serde::{Deserialize, Serialize};

/// A prompt sentence. Read-only from the pipeline's point of view: looked
/// up for existence and snapshotted onto the clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub id: String,
    pub text: String,
    pub locale_id: i32,
}
