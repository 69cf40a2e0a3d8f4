//! `SQLite` implementation of [`AuditLog`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use assetcycle_app::ports::AuditLog;
use assetcycle_domain::audit::{AuditAction, AuditLogEntry};
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::{AssetId, AuditEntryId};

use crate::codec::{decode_error, decode_ts, encode_ts, limit};
use crate::error::StorageError;

struct Wrapper(AuditLogEntry);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let asset_id: String = row.try_get("asset_id")?;
        let action: String = row.try_get("action")?;
        let performed_by: String = row.try_get("performed_by")?;
        let details: String = row.try_get("details")?;
        let timestamp: String = row.try_get("timestamp")?;

        Ok(Self(AuditLogEntry {
            id: AuditEntryId::from_str(&id).map_err(decode_error)?,
            asset_id: AssetId::from_str(&asset_id).map_err(decode_error)?,
            action: AuditAction::from_str(&action).map_err(decode_error)?,
            performed_by,
            details: serde_json::from_str(&details).map_err(decode_error)?,
            timestamp: decode_ts(&timestamp)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO audit_log (id, asset_id, action, performed_by, details, timestamp)
    VALUES (?, ?, ?, ?, ?, ?)
";

// Entries of one run share a timestamp; rowid keeps insertion order.
const SELECT_RECENT: &str =
    "SELECT * FROM audit_log ORDER BY timestamp DESC, rowid DESC LIMIT ?";
const SELECT_BY_ASSET: &str =
    "SELECT * FROM audit_log WHERE asset_id = ? ORDER BY timestamp DESC, rowid DESC LIMIT ?";

/// `SQLite`-backed, append-only audit log.
pub struct SqliteAuditLog {
    pool: SqlitePool,
}

impl SqliteAuditLog {
    /// Create a new audit log using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AuditLog for SqliteAuditLog {
    async fn append(&self, entry: AuditLogEntry) -> Result<AuditLogEntry, AssetCycleError> {
        let details = serde_json::to_string(&entry.details).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(entry.id.to_string())
            .bind(entry.asset_id.to_string())
            .bind(entry.action.as_str())
            .bind(&entry.performed_by)
            .bind(&details)
            .bind(encode_ts(entry.timestamp))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(entry)
    }

    async fn get_recent(&self, max: usize) -> Result<Vec<AuditLogEntry>, AssetCycleError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(limit(max))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_asset(
        &self,
        asset_id: AssetId,
        max: usize,
    ) -> Result<Vec<AuditLogEntry>, AssetCycleError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_ASSET)
            .bind(asset_id.to_string())
            .bind(limit(max))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
