//! `SQLite` implementation of [`ConfigRepository`].
//!
//! The configuration is a single JSON document in a one-row table.

use sqlx::SqlitePool;

use assetcycle_app::ports::ConfigRepository;
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::lifecycle::LifecycleConfig;
use assetcycle_domain::time::now;

use crate::codec::encode_ts;
use crate::error::StorageError;

const SELECT: &str = "SELECT config FROM lifecycle_config WHERE id = 1";

const UPSERT: &str = r"
    INSERT INTO lifecycle_config (id, config, updated_at)
    VALUES (1, ?, ?)
    ON CONFLICT(id) DO UPDATE SET config = excluded.config, updated_at = excluded.updated_at
";

/// `SQLite`-backed lifecycle configuration store.
pub struct SqliteConfigRepository {
    pool: SqlitePool,
}

impl SqliteConfigRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ConfigRepository for SqliteConfigRepository {
    async fn load(&self) -> Result<Option<LifecycleConfig>, AssetCycleError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let Some((json,)) = row else {
            return Ok(None);
        };
        let config = serde_json::from_str(&json).map_err(StorageError::from)?;
        Ok(Some(config))
    }

    async fn save(&self, config: LifecycleConfig) -> Result<LifecycleConfig, AssetCycleError> {
        let json = serde_json::to_string(&config).map_err(StorageError::from)?;

        sqlx::query(UPSERT)
            .bind(&json)
            .bind(encode_ts(now()))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(config)
    }
}
