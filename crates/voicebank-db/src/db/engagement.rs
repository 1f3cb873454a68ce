//! Thin stand-ins for the gamification collaborators.
//!
//! The pipeline treats achievement/goal evaluation and challenge bonuses as
//! black boxes behind the `ProgressEvaluator` and `BonusEvaluator` traits;
//! these implementations keep just enough state to answer the calls the
//! contribution paths make.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use voicebank_core::{AppError, BonusEvaluator, BonusKind, ChallengeToken, ProgressEvaluator};

/// Contribution-count and goal bookkeeping.
#[derive(Clone)]
pub struct AwardsRepository {
    pool: MySqlPool,
}

impl AwardsRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressEvaluator for AwardsRepository {
    #[tracing::instrument(skip(self), fields(db.table = "contribution_counts"))]
    async fn check_progress(&self, client_id: &str, locale_id: i32) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO contribution_counts (client_id, locale_id, count)
            VALUES (?, ?, 1)
            ON DUPLICATE KEY UPDATE count = count + 1
            "#,
        )
        .bind(client_id)
        .bind(locale_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "custom_goals"))]
    async fn check_goals_after_contribution(
        &self,
        client_id: &str,
        locale_id: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE custom_goals
            SET reached_at = NOW()
            WHERE client_id = ? AND locale_id = ? AND reached_at IS NULL
              AND target <= (
                SELECT count FROM contribution_counts
                WHERE client_id = ? AND locale_id = ?
              )
            "#,
        )
        .bind(client_id)
        .bind(locale_id)
        .bind(client_id)
        .bind(locale_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Challenge bonus bookkeeping. Earning is an idempotent insert, so the
/// first contribution of a kind wins the toast and repeats are silent.
#[derive(Clone)]
pub struct ChallengeRepository {
    pool: MySqlPool,
}

impl ChallengeRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BonusEvaluator for ChallengeRepository {
    #[tracing::instrument(skip(self), fields(db.table = "earned_bonuses"))]
    async fn earn_bonus(
        &self,
        kind: BonusKind,
        client_id: &str,
        token: &ChallengeToken,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT IGNORE INTO earned_bonuses (bonus_kind, client_id, challenge) VALUES (?, ?, ?)",
        )
        .bind(kind.as_str())
        .bind(client_id)
        .bind(token.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "earned_bonuses"))]
    async fn has_earned_bonus(
        &self,
        kind: BonusKind,
        client_id: &str,
        token: &ChallengeToken,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM earned_bonuses WHERE bonus_kind = ? AND client_id = ? AND challenge = ?",
        )
        .bind(kind.as_str())
        .bind(client_id)
        .bind(token.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "challenges"))]
    async fn has_challenge_ended(&self, token: &ChallengeToken) -> Result<bool, AppError> {
        let finish: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT finish_date FROM challenges WHERE token = ?")
                .bind(token.as_str())
                .fetch_optional(&self.pool)
                .await?;

        // An unknown campaign row counts as ended.
        Ok(match finish {
            Some(Some(finish_date)) => finish_date <= Utc::now(),
            Some(None) => false,
            None => true,
        })
    }
}
