//! `SQLite` implementation of [`RunRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use assetcycle_app::ports::RunRepository;
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::RunId;
use assetcycle_domain::lifecycle::{
    LifecycleRun, RunCounts, RunFailure, RunPhases, RunStatus, SkippedAsset, TriggerType,
};
use assetcycle_domain::time::Timestamp;

use crate::codec::{decode_error, decode_opt_ts, decode_ts, encode_ts, limit};
use crate::error::StorageError;

struct Wrapper(LifecycleRun);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<LifecycleRun> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let started_at: String = row.try_get("started_at")?;
        let finished_at: Option<String> = row.try_get("finished_at")?;
        let trigger_type: String = row.try_get("trigger_type")?;
        let triggered_by: Option<String> = row.try_get("triggered_by")?;
        let phases: String = row.try_get("phases")?;
        let status: String = row.try_get("status")?;
        let dead_stock_moved: i64 = row.try_get("dead_stock_moved")?;
        let disposal_moved: i64 = row.try_get("disposal_moved")?;
        let skipped: String = row.try_get("skipped")?;
        let error: Option<String> = row.try_get("error")?;

        let skipped: Vec<SkippedAsset> = serde_json::from_str(&skipped).map_err(decode_error)?;
        let error: Option<RunFailure> = error
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(decode_error)?;

        Ok(Self(LifecycleRun {
            id: RunId::from_str(&id).map_err(decode_error)?,
            started_at: decode_ts(&started_at)?,
            finished_at: decode_opt_ts(finished_at)?,
            trigger_type: TriggerType::from_str(&trigger_type).map_err(decode_error)?,
            triggered_by,
            phases: RunPhases::from_str(&phases).map_err(decode_error)?,
            counts: RunCounts {
                dead_stock_moved: u64::try_from(dead_stock_moved).map_err(decode_error)?,
                disposal_moved: u64::try_from(disposal_moved).map_err(decode_error)?,
            },
            skipped,
            status: RunStatus::from_str(&status).map_err(decode_error)?,
            error,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO lifecycle_runs (id, started_at, finished_at, trigger_type, triggered_by, phases,
                                status, dead_stock_moved, disposal_moved, skipped, error)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE: &str = r"
    UPDATE lifecycle_runs
    SET finished_at = ?, status = ?, dead_stock_moved = ?, disposal_moved = ?, skipped = ?,
        error = ?
    WHERE id = ?
";

const SELECT_BY_ID: &str = "SELECT * FROM lifecycle_runs WHERE id = ?";
const SELECT_RECENT: &str =
    "SELECT * FROM lifecycle_runs ORDER BY started_at DESC, rowid DESC LIMIT ?";

const ABANDON_RUNNING: &str =
    "UPDATE lifecycle_runs SET status = ?, finished_at = ? WHERE status = ?";

/// Columns rewritten whenever a run's summary changes.
struct Summary {
    finished_at: Option<String>,
    dead_stock_moved: i64,
    disposal_moved: i64,
    skipped: String,
    error: Option<String>,
}

impl Summary {
    fn of(run: &LifecycleRun) -> Result<Self, StorageError> {
        Ok(Self {
            finished_at: run.finished_at.map(encode_ts),
            dead_stock_moved: i64::try_from(run.counts.dead_stock_moved).unwrap_or(i64::MAX),
            disposal_moved: i64::try_from(run.counts.disposal_moved).unwrap_or(i64::MAX),
            skipped: serde_json::to_string(&run.skipped)?,
            error: run.error.as_ref().map(serde_json::to_string).transpose()?,
        })
    }
}

/// `SQLite`-backed run history.
pub struct SqliteRunRepository {
    pool: SqlitePool,
}

impl SqliteRunRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RunRepository for SqliteRunRepository {
    async fn create(&self, run: LifecycleRun) -> Result<LifecycleRun, AssetCycleError> {
        let summary = Summary::of(&run)?;

        sqlx::query(INSERT)
            .bind(run.id.to_string())
            .bind(encode_ts(run.started_at))
            .bind(summary.finished_at)
            .bind(run.trigger_type.as_str())
            .bind(run.triggered_by.as_deref())
            .bind(run.phases.as_str())
            .bind(run.status.as_str())
            .bind(summary.dead_stock_moved)
            .bind(summary.disposal_moved)
            .bind(summary.skipped)
            .bind(summary.error)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(run)
    }

    async fn update(&self, run: LifecycleRun) -> Result<LifecycleRun, AssetCycleError> {
        let summary = Summary::of(&run)?;

        sqlx::query(UPDATE)
            .bind(summary.finished_at)
            .bind(run.status.as_str())
            .bind(summary.dead_stock_moved)
            .bind(summary.disposal_moved)
            .bind(summary.skipped)
            .bind(summary.error)
            .bind(run.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(run)
    }

    async fn get_by_id(&self, id: RunId) -> Result<Option<LifecycleRun>, AssetCycleError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_recent(&self, max: usize) -> Result<Vec<LifecycleRun>, AssetCycleError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(limit(max))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn abandon_running(&self, at: Timestamp) -> Result<u64, AssetCycleError> {
        let result = sqlx::query(ABANDON_RUNNING)
            .bind(RunStatus::Abandoned.as_str())
            .bind(encode_ts(at))
            .bind(RunStatus::Running.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(result.rows_affected())
    }
}
