pub mod clip;
pub mod sentence;

pub use clip::{
    ChallengeFlags, Clip, ClipCandidate, EligibleClip, NewClip, SampledSentence, UploadOutcome,
    VoteOutcome,
};
pub use sentence::Sentence;
