//! Challenge-campaign tokens and bonus kinds.
//!
//! A challenge token is a short campaign code sent in the `challenge`
//! header. Only values in the compiled-in registry unlock bonus-award
//! evaluation; anything else is treated as if no token was sent.

use serde::{Deserialize, Serialize};

/// Campaign codes currently recognized by bonus evaluation.
pub const CHALLENGE_TOKENS: &[&str] = &["mozilla", "ibm", "sap"];

/// A validated challenge token. Construction only succeeds for registry
/// members, so holding one proves the campaign is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeToken(String);

impl ChallengeToken {
    /// Parse a header/body value into a token. `None` for absent values and
    /// for codes outside the registry.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let value = value?.trim();
        CHALLENGE_TOKENS
            .contains(&value)
            .then(|| ChallengeToken(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChallengeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bonus categories a contribution can earn during a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusKind {
    FirstContribution,
    InviteContributeSameSession,
    ThreeDayStreak,
}

impl BonusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusKind::FirstContribution => "first_contribution",
            BonusKind::InviteContributeSameSession => "invite_contribute_same_session",
            BonusKind::ThreeDayStreak => "three_day_streak",
        }
    }
}
