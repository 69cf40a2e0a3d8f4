//! `SQLite` implementation of [`AssetStore`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use assetcycle_app::ports::{AssetFilter, AssetStore};
use assetcycle_domain::asset::{Asset, AssetPatch, AssetStatus};
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::AssetId;

use crate::codec::{decode_error, decode_opt_ts, encode_ts};
use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Asset);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Asset> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let category: String = row.try_get("category")?;
        let status: String = row.try_get("status")?;
        let last_audit_date: Option<String> = row.try_get("last_audit_date")?;
        let last_activity_date: Option<String> = row.try_get("last_activity_date")?;
        let dead_stock_since: Option<String> = row.try_get("dead_stock_since")?;
        let disposal_date: Option<String> = row.try_get("disposal_date")?;
        let disposal_approved: Option<bool> = row.try_get("disposal_approved")?;

        Ok(Self(Asset {
            id: AssetId::from_str(&id).map_err(decode_error)?,
            name,
            category,
            status: AssetStatus::from_str(&status).map_err(decode_error)?,
            last_audit_date: decode_opt_ts(last_audit_date)?,
            last_activity_date: decode_opt_ts(last_activity_date)?,
            dead_stock_since: decode_opt_ts(dead_stock_since)?,
            disposal_date: decode_opt_ts(disposal_date)?,
            disposal_approved,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO assets (id, name, category, status, last_audit_date, last_activity_date,
                        dead_stock_since, disposal_date, disposal_approved)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        category = excluded.category,
        status = excluded.status,
        last_audit_date = excluded.last_audit_date,
        last_activity_date = excluded.last_activity_date,
        dead_stock_since = excluded.dead_stock_since,
        disposal_date = excluded.disposal_date,
        disposal_approved = excluded.disposal_approved
";

const SELECT_BY_ID: &str = "SELECT * FROM assets WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM assets ORDER BY id";
const SELECT_BY_STATUS: &str = "SELECT * FROM assets WHERE status = ? ORDER BY id";

const COMPARE_AND_UPDATE: &str = r"
    UPDATE assets
    SET status = ?,
        dead_stock_since = COALESCE(?, dead_stock_since),
        disposal_date = COALESCE(?, disposal_date)
    WHERE id = ? AND status = ?
";

/// `SQLite`-backed asset store.
pub struct SqliteAssetStore {
    pool: SqlitePool,
}

impl SqliteAssetStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or fully replace an asset.
    ///
    /// Assets are owned by the inventory system; this is how its records
    /// are mirrored into the engine's database.
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::Validation`] if invariants fail, or a
    /// storage error.
    pub async fn upsert(&self, asset: Asset) -> Result<Asset, AssetCycleError> {
        asset.validate()?;

        sqlx::query(UPSERT)
            .bind(asset.id.to_string())
            .bind(&asset.name)
            .bind(&asset.category)
            .bind(asset.status.as_str())
            .bind(asset.last_audit_date.map(encode_ts))
            .bind(asset.last_activity_date.map(encode_ts))
            .bind(asset.dead_stock_since.map(encode_ts))
            .bind(asset.disposal_date.map(encode_ts))
            .bind(asset.disposal_approved)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(asset)
    }
}

impl AssetStore for SqliteAssetStore {
    async fn query_assets(&self, filter: AssetFilter) -> Result<Vec<Asset>, AssetCycleError> {
        let query = match filter.status {
            Some(status) => sqlx::query_as::<_, Wrapper>(SELECT_BY_STATUS).bind(status.as_str()),
            None => sqlx::query_as::<_, Wrapper>(SELECT_ALL),
        };
        let rows: Vec<Wrapper> = query
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_by_id(&self, id: AssetId) -> Result<Option<Asset>, AssetCycleError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn compare_and_update(
        &self,
        id: AssetId,
        expected: AssetStatus,
        patch: AssetPatch,
    ) -> Result<bool, AssetCycleError> {
        let result = sqlx::query(COMPARE_AND_UPDATE)
            .bind(patch.status.as_str())
            .bind(patch.dead_stock_since.map(encode_ts))
            .bind(patch.disposal_date.map(encode_ts))
            .bind(id.to_string())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use assetcycle_domain::time::{days, now};

    async fn setup() -> SqliteAssetStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteAssetStore::new(db.pool().clone())
    }

    fn laptop() -> Asset {
        Asset::builder()
            .name("Laptop")
            .category("Laptop")
            .last_activity_date(now() - days(400))
            .disposal_approved(true)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_store_and_read_back_asset() {
        let store = setup().await;
        let asset = laptop();

        store.upsert(asset.clone()).await.unwrap();

        assert_eq!(store.get_by_id(asset.id).await.unwrap(), Some(asset));
    }

    #[tokio::test]
    async fn should_return_none_when_asset_missing() {
        let store = setup().await;
        assert!(store.get_by_id(AssetId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_reject_asset_without_name() {
        let store = setup().await;
        let mut asset = laptop();
        asset.name = String::new();

        let result = store.upsert(asset).await;

        assert!(matches!(result, Err(AssetCycleError::Validation(_))));
    }

    #[tokio::test]
    async fn should_filter_by_status() {
        let store = setup().await;
        let active = laptop();
        let mut dead = laptop();
        dead.status = AssetStatus::DeadStock;
        store.upsert(active.clone()).await.unwrap();
        store.upsert(dead.clone()).await.unwrap();

        let found = store
            .query_assets(AssetFilter::with_status(AssetStatus::DeadStock))
            .await
            .unwrap();

        assert_eq!(found, vec![dead]);
        assert_eq!(store.query_assets(AssetFilter::all()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_apply_patch_when_status_matches() {
        let store = setup().await;
        let asset = laptop();
        store.upsert(asset.clone()).await.unwrap();
        let at = now();

        let swapped = store
            .compare_and_update(asset.id, AssetStatus::Active, AssetPatch::dead_stock(at))
            .await
            .unwrap();

        assert!(swapped);
        let stored = store.get_by_id(asset.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssetStatus::DeadStock);
        assert_eq!(stored.dead_stock_since, Some(at));
        assert_eq!(stored.last_activity_date, asset.last_activity_date);
    }

    #[tokio::test]
    async fn should_keep_dead_stock_since_when_disposing() {
        let store = setup().await;
        let since = now() - days(100);
        let mut asset = laptop();
        asset.status = AssetStatus::DeadStock;
        asset.dead_stock_since = Some(since);
        store.upsert(asset.clone()).await.unwrap();

        store
            .compare_and_update(asset.id, AssetStatus::DeadStock, AssetPatch::disposal(now()))
            .await
            .unwrap();

        let stored = store.get_by_id(asset.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssetStatus::Disposed);
        assert_eq!(stored.dead_stock_since, Some(since));
        assert!(stored.disposal_date.is_some());
    }

    #[tokio::test]
    async fn should_not_write_when_status_changed() {
        let store = setup().await;
        let mut asset = laptop();
        asset.status = AssetStatus::UnderReview;
        store.upsert(asset.clone()).await.unwrap();

        let swapped = store
            .compare_and_update(asset.id, AssetStatus::Active, AssetPatch::dead_stock(now()))
            .await
            .unwrap();

        assert!(!swapped);
        assert_eq!(store.get_by_id(asset.id).await.unwrap(), Some(asset));
    }

    #[tokio::test]
    async fn should_report_no_swap_for_unknown_asset() {
        let store = setup().await;
        let swapped = store
            .compare_and_update(AssetId::new(), AssetStatus::Active, AssetPatch::dead_stock(now()))
            .await
            .unwrap();
        assert!(!swapped);
    }
}
