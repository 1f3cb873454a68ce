//! Post-contribution side effects, shared by clip upload and vote
//! submission.
//!
//! Achievement and goal evaluation are awaited but best-effort: a failure
//! is logged and never alters the success response. The basket sync is
//! spawned and forgotten. Challenge flags are the one side effect whose
//! result the response depends on, so its errors propagate.

use std::sync::Arc;

use voicebank_core::models::ChallengeFlags;
use voicebank_core::{
    AppError, BonusEvaluator, BonusKind, ChallengeToken, MarketingSync, ProgressEvaluator,
};

/// Run the best-effort side-effect chain for one contribution.
pub async fn run_contribution_side_effects(
    progress: &Arc<dyn ProgressEvaluator>,
    basket: &Arc<dyn MarketingSync>,
    client_id: &str,
    locale_id: i32,
) {
    if let Err(e) = progress.check_progress(client_id, locale_id).await {
        tracing::warn!(error = %e, client_id, "achievement progress check failed");
    }

    if let Err(e) = progress
        .check_goals_after_contribution(client_id, locale_id)
        .await
    {
        tracing::warn!(error = %e, client_id, "goal evaluation failed");
    }

    let basket = basket.clone();
    let client_id = client_id.to_string();
    tokio::spawn(async move {
        if let Err(e) = basket.sync(&client_id).await {
            tracing::warn!(error = %e, client_id, "basket sync failed");
        }
    });
}

/// Evaluate the bonus flags for a contribution made under a challenge.
pub async fn challenge_flags(
    bonuses: &Arc<dyn BonusEvaluator>,
    client_id: &str,
    token: &ChallengeToken,
) -> Result<ChallengeFlags, AppError> {
    Ok(ChallengeFlags {
        show_first_contribution_toast: bonuses
            .earn_bonus(BonusKind::FirstContribution, client_id, token)
            .await?,
        has_earned_session_toast: bonuses
            .has_earned_bonus(BonusKind::InviteContributeSameSession, client_id, token)
            .await?,
        show_first_streak_toast: bonuses
            .earn_bonus(BonusKind::ThreeDayStreak, client_id, token)
            .await?,
        challenge_ended: bonuses.has_challenge_ended(token).await?,
    })
}
