//! Run Store — persistence seam plus the SQLite implementation.
//!
//! The engine only supplies values at three points (run start, per prompt,
//! run finish) and never mutates a run after `finish_run`. Each call acquires
//! a pooled connection; no transaction spans a whole run, so a crash mid-run
//! leaves a run row without `finished_at` and a partial result set — an
//! accepted, observable state, not corruption.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::analysis::aggregate::RunSummary;
use crate::analysis::outcome::PromptOutcome;
use crate::catalog::PromptDefinition;
use crate::errors::AppError;

/// One persisted per-prompt verdict, as read back from the store.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PromptResultRow {
    pub id: i64,
    pub run_id: String,
    pub prompt_id: String,
    pub prompt_version: i64,
    pub prompt_name: String,
    pub score: i64,
    pub rating: String,
    pub target_buy_price: f64,
    pub rationale: String,
    pub raw_response: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence seam for analysis runs. Implement this to swap storage
/// backends without touching the pipeline.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Opens a run record and returns its id.
    async fn start_run(&self, ticker: &str, context_json: &str) -> Result<Uuid, AppError>;

    /// Persists one prompt's verdict within a run.
    async fn save_prompt_result(
        &self,
        run_id: Uuid,
        prompt: &PromptDefinition,
        outcome: &PromptOutcome,
    ) -> Result<(), AppError>;

    /// Closes a run record with its aggregated summary.
    async fn finish_run(&self, run_id: Uuid, summary: &RunSummary) -> Result<(), AppError>;

    /// Read path for later inspection: persisted verdicts in insertion order.
    async fn get_prompt_results(&self, run_id: Uuid) -> Result<Vec<PromptResultRow>, AppError>;
}

/// SQLite-backed run store over an sqlx pool.
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunStore for SqliteRunStore {
    async fn start_run(&self, ticker: &str, context_json: &str) -> Result<Uuid, AppError> {
        let run_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO runs (run_id, ticker, context_json, started_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(run_id.to_string())
        .bind(ticker)
        .bind(context_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(run_id)
    }

    async fn save_prompt_result(
        &self,
        run_id: Uuid,
        prompt: &PromptDefinition,
        outcome: &PromptOutcome,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO prompt_results
                (run_id, prompt_id, prompt_version, prompt_name, score, rating,
                 target_buy_price, rationale, raw_response, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run_id.to_string())
        .bind(&prompt.prompt_id)
        .bind(prompt.version)
        .bind(&prompt.name)
        .bind(outcome.score)
        .bind(&outcome.rating)
        .bind(outcome.target_buy_price)
        .bind(&outcome.rationale)
        .bind(&outcome.raw_text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn finish_run(&self, run_id: Uuid, summary: &RunSummary) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE runs
            SET finished_at = ?, average_score = ?, final_rating = ?, final_target_price = ?
            WHERE run_id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(summary.average_score)
        .bind(&summary.final_rating)
        .bind(summary.final_target_price)
        .bind(run_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_prompt_results(&self, run_id: Uuid) -> Result<Vec<PromptResultRow>, AppError> {
        let rows = sqlx::query_as::<_, PromptResultRow>(
            r#"
            SELECT id, run_id, prompt_id, prompt_version, prompt_name, score, rating,
                   target_buy_price, rationale, raw_response, created_at
            FROM prompt_results
            WHERE run_id = ?
            ORDER BY id
            "#,
        )
        .bind(run_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> (SqliteRunStore, SqlitePool) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_db(&pool).await.unwrap();
        (SqliteRunStore::new(pool.clone()), pool)
    }

    fn prompt(id: &str, version: i64) -> PromptDefinition {
        PromptDefinition {
            prompt_id: id.to_string(),
            name: format!("{id} name"),
            version,
            template: "t".to_string(),
            schema: None,
        }
    }

    fn outcome(score: i64) -> PromptOutcome {
        PromptOutcome {
            score,
            rating: "BUY".to_string(),
            target_buy_price: 42.5,
            rationale: "because".to_string(),
            raw_text: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_run_round_trip() {
        let (store, pool) = memory_store().await;

        let run_id = store.start_run("AAPL", r#"{"ticker":"AAPL"}"#).await.unwrap();
        store
            .save_prompt_result(run_id, &prompt("p1", 1), &outcome(80))
            .await
            .unwrap();
        store
            .save_prompt_result(run_id, &prompt("p2", 3), &outcome(40))
            .await
            .unwrap();
        store
            .finish_run(
                run_id,
                &RunSummary {
                    average_score: 60.0,
                    final_rating: "BUY".to_string(),
                    final_target_price: 42.5,
                },
            )
            .await
            .unwrap();

        let rows = store.get_prompt_results(run_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].prompt_id, "p1");
        assert_eq!(rows[0].score, 80);
        assert_eq!(rows[1].prompt_id, "p2");
        assert_eq!(rows[1].prompt_version, 3);

        let (rating, avg): (String, f64) =
            sqlx::query_as("SELECT final_rating, average_score FROM runs WHERE run_id = ?")
                .bind(run_id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(rating, "BUY");
        assert_eq!(avg, 60.0);
    }

    #[tokio::test]
    async fn test_unfinished_run_has_no_finished_at() {
        let (store, pool) = memory_store().await;
        let run_id = store.start_run("MSFT", "{}").await.unwrap();

        let finished: Option<String> =
            sqlx::query_scalar("SELECT finished_at FROM runs WHERE run_id = ?")
                .bind(run_id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(finished.is_none());
    }

    #[tokio::test]
    async fn test_results_are_scoped_to_run() {
        let (store, _pool) = memory_store().await;
        let first = store.start_run("AAPL", "{}").await.unwrap();
        let second = store.start_run("MSFT", "{}").await.unwrap();
        store
            .save_prompt_result(first, &prompt("p1", 1), &outcome(10))
            .await
            .unwrap();

        assert_eq!(store.get_prompt_results(first).await.unwrap().len(), 1);
        assert!(store.get_prompt_results(second).await.unwrap().is_empty());
    }
}
