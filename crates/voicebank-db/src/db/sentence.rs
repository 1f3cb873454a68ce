//! Sentence repository: lookups against the sentences and
//! sentence_variants tables.

use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::collections::HashMap;

use voicebank_core::models::Sentence;
use voicebank_core::{AppError, SentenceStore};

#[derive(Debug, sqlx::FromRow)]
struct SentenceRow {
    id: String,
    text: String,
    locale_id: i32,
}

#[derive(Clone)]
pub struct SentenceRepository {
    pool: MySqlPool,
}

impl SentenceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SentenceStore for SentenceRepository {
    #[tracing::instrument(skip(self), fields(db.table = "sentences"))]
    async fn find_sentence(&self, id: &str) -> Result<Option<Sentence>, AppError> {
        let row: Option<SentenceRow> = sqlx::query_as::<MySql, SentenceRow>(
            "SELECT id, text, locale_id FROM sentences WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Sentence {
            id: r.id,
            text: r.text,
            locale_id: r.locale_id,
        }))
    }

    /// One `IN (...)` query for the whole id batch, avoiding a per-clip
    /// round trip on the sampling read path.
    #[tracing::instrument(skip(self, ids), fields(db.table = "sentence_variants", batch = ids.len()))]
    async fn find_variants_by_sentence_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, String>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = QueryBuilder::<MySql>::new(
            "SELECT sentence_id, variant_token FROM sentence_variants WHERE sentence_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String)> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().collect())
    }
}
