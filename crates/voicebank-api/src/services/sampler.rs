//! Randomized clip sampler.
//!
//! Selects a batch of clips the calling client may listen to and
//! validate. The eligibility query already excludes the client's own
//! recordings; this layer over-fetches to absorb broken rows, assembles
//! candidates in the order the store returned them, and flags anything
//! unmappable instead of failing the call. Callers must accept short
//! results.

use std::collections::HashMap;
use std::sync::Arc;

use voicebank_core::constants::{CLIP_EXTENSION, SAMPLER_OVERFETCH};
use voicebank_core::models::{ClipCandidate, EligibleClip, SampledSentence};
use voicebank_core::{AppError, ClipStore, SentenceStore};
use voicebank_storage::Storage;

use crate::state::AppState;

pub struct ClipSampler {
    clips: Arc<dyn ClipStore>,
    sentences: Arc<dyn SentenceStore>,
    storage: Arc<dyn Storage>,
}

impl ClipSampler {
    pub fn new(state: &AppState) -> Self {
        Self {
            clips: state.clips.clone(),
            sentences: state.sentences.clone(),
            storage: state.storage.clone(),
        }
    }

    /// Return up to `count` eligible clips. Never fails because of a bad
    /// candidate; degrades to fewer clips instead.
    #[tracing::instrument(skip(self), fields(operation = "get_random_clips"))]
    pub async fn get_random_clips(
        &self,
        client_id: &str,
        locale: &str,
        count: usize,
    ) -> Result<Vec<ClipCandidate>, AppError> {
        let fetch_count = (count as f64 * SAMPLER_OVERFETCH).ceil() as u32;
        let candidates = self
            .clips
            .find_eligible_clips(client_id, locale, fetch_count)
            .await?;

        tracing::debug!(eligible = candidates.len(), locale, "eligible clips fetched");

        let mut assembled = Vec::with_capacity(count.min(candidates.len()));
        for candidate in &candidates {
            match self.to_candidate(candidate) {
                Ok(clip) => {
                    assembled.push(clip);
                    if assembled.len() == count {
                        break;
                    }
                }
                Err(reason) => {
                    tracing::warn!(clip_id = candidate.id, reason, "skipping broken clip");
                    if let Err(e) = self.clips.mark_invalid(candidate.id).await {
                        tracing::warn!(error = %e, clip_id = candidate.id, "mark_invalid failed");
                    }
                }
            }
        }

        self.append_variants(&mut assembled).await;

        tracing::debug!(assembled = assembled.len(), locale, "clips sampled");
        Ok(assembled)
    }

    fn to_candidate(&self, clip: &EligibleClip) -> Result<ClipCandidate, &'static str> {
        let glob = clip
            .path
            .strip_suffix(CLIP_EXTENSION)
            .ok_or("clip path has no audio extension")?;
        if glob.is_empty() {
            return Err("empty clip path");
        }
        if clip.original_sentence_id.is_empty() {
            return Err("clip has no sentence id");
        }
        if clip.sentence.trim().is_empty() {
            return Err("clip has no sentence text");
        }

        Ok(ClipCandidate {
            id: clip.id.to_string(),
            glob: glob.to_string(),
            sentence: SampledSentence {
                id: clip.original_sentence_id.clone(),
                text: clip.sentence.clone(),
                taxonomy: clip.taxonomy.clone(),
                variant: None,
            },
            audio_src: self.storage.url(&clip.path),
        })
    }

    /// Enrich sentence metadata with locale-variant information in one
    /// batched lookup. Lookup failure degrades to "no variant".
    async fn append_variants(&self, clips: &mut [ClipCandidate]) {
        if clips.is_empty() {
            return;
        }

        let ids: Vec<String> = clips.iter().map(|c| c.sentence.id.clone()).collect();
        let variants = match self.sentences.find_variants_by_sentence_ids(&ids).await {
            Ok(variants) => variants,
            Err(e) => {
                tracing::warn!(error = %e, "variant lookup failed");
                HashMap::new()
            }
        };

        for clip in clips {
            clip.sentence.variant = variants.get(&clip.sentence.id).cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_state, TestStateOptions};

    fn valid_clip(id: i64) -> EligibleClip {
        EligibleClip {
            id,
            path: format!("client-x/s-{}.mp3", id),
            sentence: "a sentence to read".to_string(),
            original_sentence_id: format!("s-{}", id),
            taxonomy: None,
        }
    }

    fn broken_clip(id: i64) -> EligibleClip {
        EligibleClip {
            id,
            path: format!("client-x/s-{}", id), // extension missing
            sentence: "a sentence to read".to_string(),
            original_sentence_id: format!("s-{}", id),
            taxonomy: None,
        }
    }

    #[tokio::test]
    async fn broken_candidates_are_skipped_and_flagged() {
        let state = test_state(TestStateOptions::default());
        // 7 candidates for a request of 5 (over-fetch asks for 8).
        state.fakes.clips.set_eligible(vec![
            broken_clip(1),
            valid_clip(2),
            broken_clip(3),
            valid_clip(4),
            broken_clip(5),
            valid_clip(6),
            broken_clip(7),
        ]);
        let sampler = ClipSampler::new(&state);

        let clips = sampler
            .get_random_clips("client-a", "en", 5)
            .await
            .expect("sampling never fails on bad candidates");

        assert_eq!(clips.len(), 3);
        assert_eq!(state.fakes.clips.last_eligible_limit(), Some(8));
        assert_eq!(state.fakes.clips.invalidated(), vec![1, 3, 5, 7]);
    }

    #[tokio::test]
    async fn short_candidate_lists_yield_short_results() {
        let state = test_state(TestStateOptions::default());
        state
            .fakes
            .clips
            .set_eligible((1..=6).map(valid_clip).collect());
        let sampler = ClipSampler::new(&state);

        let clips = sampler.get_random_clips("client-a", "en", 10).await.unwrap();

        assert_eq!(clips.len(), 6);
        assert!(state.fakes.clips.invalidated().is_empty());
    }

    #[tokio::test]
    async fn assembly_stops_once_count_is_reached() {
        let state = test_state(TestStateOptions::default());
        state
            .fakes
            .clips
            .set_eligible((1..=8).map(valid_clip).collect());
        let sampler = ClipSampler::new(&state);

        let clips = sampler.get_random_clips("client-a", "en", 5).await.unwrap();

        assert_eq!(clips.len(), 5);
        // Candidates keep the order the store returned them in.
        assert_eq!(clips[0].id, "1");
        assert_eq!(clips[4].id, "5");
    }

    #[tokio::test]
    async fn candidates_carry_glob_and_audio_src() {
        let state = test_state(TestStateOptions::default());
        state.fakes.clips.set_eligible(vec![valid_clip(2)]);
        let sampler = ClipSampler::new(&state);

        let clips = sampler.get_random_clips("client-a", "en", 1).await.unwrap();

        assert_eq!(clips[0].glob, "client-x/s-2");
        assert_eq!(clips[0].audio_src, "/public/audio/client-x/s-2.mp3");
    }

    #[tokio::test]
    async fn variants_are_attached_from_the_batched_lookup() {
        let state = test_state(TestStateOptions::default());
        state
            .fakes
            .clips
            .set_eligible(vec![valid_clip(1), valid_clip(2)]);
        state.fakes.sentences.set_variant("s-1", "pt-BR");
        let sampler = ClipSampler::new(&state);

        let clips = sampler.get_random_clips("client-a", "en", 2).await.unwrap();

        assert_eq!(clips[0].sentence.variant.as_deref(), Some("pt-BR"));
        assert_eq!(clips[1].sentence.variant, None);
    }

    #[tokio::test]
    async fn variant_lookup_failure_defaults_to_no_variant() {
        let state = test_state(TestStateOptions::default());
        state.fakes.clips.set_eligible(vec![valid_clip(1)]);
        state.fakes.sentences.fail_variant_lookup();
        let sampler = ClipSampler::new(&state);

        let clips = sampler.get_random_clips("client-a", "en", 1).await.unwrap();

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].sentence.variant, None);
    }
}
