use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use dynaprice_core::domain::cycle::{CycleId, CycleMode, CycleOutcome, CycleSummary};
use dynaprice_core::engine::CycleRecorder;
use dynaprice_core::errors::CatalogError;
use dynaprice_core::pricing::PricingStrategy;

use super::{CycleHistoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCycleHistory {
    pool: DbPool,
}

impl SqlCycleHistory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_mode(s: &str) -> Result<CycleMode, RepositoryError> {
    match s {
        "apply" => Ok(CycleMode::Apply),
        "dry_run" => Ok(CycleMode::DryRun),
        other => Err(RepositoryError::Decode(format!("unknown cycle mode `{other}`"))),
    }
}

fn parse_outcome(s: &str) -> Result<CycleOutcome, RepositoryError> {
    match s {
        "completed" => Ok(CycleOutcome::Completed),
        "partial_failure" => Ok(CycleOutcome::PartialFailure),
        "aborted" => Ok(CycleOutcome::Aborted),
        other => Err(RepositoryError::Decode(format!("unknown cycle outcome `{other}`"))),
    }
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn count(row: &SqliteRow, column: &str) -> Result<u64, RepositoryError> {
    let value: i64 = row.try_get(column)?;
    u64::try_from(value).map_err(|_| RepositoryError::Decode(format!("{column} is negative")))
}

fn row_to_summary(row: &SqliteRow) -> Result<CycleSummary, RepositoryError> {
    let id: String = row.try_get("id")?;
    let mode: String = row.try_get("mode")?;
    let strategy: String = row.try_get("strategy")?;
    let started_at: String = row.try_get("started_at")?;
    let finished_at: String = row.try_get("finished_at")?;
    let outcome: String = row.try_get("outcome")?;
    let errors_json: String = row.try_get("errors_json")?;

    Ok(CycleSummary {
        cycle_id: CycleId(id),
        mode: parse_mode(&mode)?,
        strategy: strategy.parse::<PricingStrategy>().map_err(RepositoryError::Decode)?,
        started_at: parse_timestamp("started_at", &started_at)?,
        finished_at: parse_timestamp("finished_at", &finished_at)?,
        scanned: count(row, "scanned")?,
        changed: count(row, "changed")?,
        updated: count(row, "updated")?,
        skipped: count(row, "skipped")?,
        errors: serde_json::from_str(&errors_json)
            .map_err(|e| RepositoryError::Decode(format!("errors_json: {e}")))?,
        outcome: parse_outcome(&outcome)?,
    })
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl SqlCycleHistory {
    async fn insert(&self, summary: &CycleSummary) -> Result<(), RepositoryError> {
        let errors_json = serde_json::to_string(&summary.errors)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO pricing_cycle (id, mode, strategy, started_at, finished_at,
                                        scanned, changed, updated, skipped, outcome, errors_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&summary.cycle_id.0)
        .bind(summary.mode.as_str())
        .bind(summary.strategy.as_str())
        .bind(summary.started_at.to_rfc3339())
        .bind(summary.finished_at.to_rfc3339())
        .bind(to_i64(summary.scanned))
        .bind(to_i64(summary.changed))
        .bind(to_i64(summary.updated))
        .bind(to_i64(summary.skipped))
        .bind(summary.outcome.as_str())
        .bind(errors_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CycleRecorder for SqlCycleHistory {
    async fn record(&self, summary: &CycleSummary) -> Result<(), CatalogError> {
        self.insert(summary).await.map_err(|e| CatalogError::WriteFailed(e.to_string()))
    }
}

#[async_trait]
impl CycleHistoryRepository for SqlCycleHistory {
    async fn recent(&self, limit: u32) -> Result<Vec<CycleSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, mode, strategy, started_at, finished_at, scanned, changed, updated,
                    skipped, outcome, errors_json
             FROM pricing_cycle
             ORDER BY started_at DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_summary).collect()
    }
}
