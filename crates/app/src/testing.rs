//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use assetcycle_domain::asset::{Asset, AssetPatch, AssetStatus};
use assetcycle_domain::audit::{AuditAction, AuditLogEntry};
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::{AssetId, RunId};
use assetcycle_domain::lifecycle::{LifecycleConfig, LifecycleRun, RunStatus};
use assetcycle_domain::time::Timestamp;

use crate::ports::{AssetFilter, AssetStore, AuditLog, ConfigRepository, RunRepository};

/// Error used to simulate an unreachable store.
#[derive(Debug, thiserror::Error)]
#[error("store unreachable")]
pub struct Unreachable;

pub fn unreachable() -> AssetCycleError {
    AssetCycleError::Storage(Box::new(Unreachable))
}

// ── Assets ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAssetStore {
    assets: Mutex<HashMap<AssetId, Asset>>,
    /// Number of successful writes allowed before every write fails.
    writes_before_failure: Mutex<Option<usize>>,
    /// Status forced onto an asset right before its compare-and-set.
    interference: Mutex<HashMap<AssetId, AssetStatus>>,
    write_delay: Mutex<Option<Duration>>,
    fail_queries: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryAssetStore {
    pub fn with(assets: Vec<Asset>) -> Self {
        let store = Self::default();
        store
            .assets
            .lock()
            .unwrap()
            .extend(assets.into_iter().map(|a| (a.id, a)));
        store
    }

    pub fn get(&self, id: AssetId) -> Asset {
        self.assets.lock().unwrap()[&id].clone()
    }

    pub fn insert(&self, asset: Asset) {
        self.assets.lock().unwrap().insert(asset.id, asset);
    }

    pub fn count_in(&self, status: AssetStatus) -> usize {
        self.assets
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.status == status)
            .count()
    }

    pub fn fail_after_writes(&self, writes: usize) {
        *self.writes_before_failure.lock().unwrap() = Some(writes);
    }

    pub fn heal(&self) {
        *self.writes_before_failure.lock().unwrap() = None;
        *self.write_delay.lock().unwrap() = None;
        self.fail_queries.store(false, Ordering::SeqCst);
    }

    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    pub fn interfere(&self, id: AssetId, status: AssetStatus) {
        self.interference.lock().unwrap().insert(id, status);
    }

    pub fn slow_writes(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }
}

impl AssetStore for InMemoryAssetStore {
    async fn query_assets(&self, filter: AssetFilter) -> Result<Vec<Asset>, AssetCycleError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        let assets = self.assets.lock().unwrap();
        Ok(assets
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: AssetId) -> Result<Option<Asset>, AssetCycleError> {
        Ok(self.assets.lock().unwrap().get(&id).cloned())
    }

    async fn compare_and_update(
        &self,
        id: AssetId,
        expected: AssetStatus,
        patch: AssetPatch,
    ) -> Result<bool, AssetCycleError> {
        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(limit) = *self.writes_before_failure.lock().unwrap() {
            if self.writes.load(Ordering::SeqCst) >= limit {
                return Err(unreachable());
            }
        }

        let mut assets = self.assets.lock().unwrap();
        if let Some(forced) = self.interference.lock().unwrap().remove(&id) {
            if let Some(asset) = assets.get_mut(&id) {
                asset.status = forced;
            }
        }
        match assets.get_mut(&id) {
            Some(asset) if asset.status == expected => {
                asset.apply(&patch);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ── Audit log ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditLogEntry>>,
    append_delay: Mutex<Option<Duration>>,
    fail_appends: AtomicBool,
}

impl InMemoryAuditLog {
    pub fn slow_appends(&self, delay: Duration) {
        *self.append_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count_for(&self, asset_id: AssetId, action: AuditAction) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.asset_id == asset_id && e.action == action)
            .count()
    }
}

impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: AuditLogEntry) -> Result<AuditLogEntry, AssetCycleError> {
        let delay = *self.append_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, AssetCycleError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn find_by_asset(
        &self,
        asset_id: AssetId,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AssetCycleError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.asset_id == asset_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

// ── Config ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryConfigRepo {
    stored: Mutex<Option<LifecycleConfig>>,
    fail_saves: AtomicBool,
}

impl InMemoryConfigRepo {
    pub fn with(config: LifecycleConfig) -> Self {
        Self {
            stored: Mutex::new(Some(config)),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn stored(&self) -> Option<LifecycleConfig> {
        self.stored.lock().unwrap().clone()
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }
}

impl ConfigRepository for InMemoryConfigRepo {
    async fn load(&self) -> Result<Option<LifecycleConfig>, AssetCycleError> {
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn save(&self, config: LifecycleConfig) -> Result<LifecycleConfig, AssetCycleError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        *self.stored.lock().unwrap() = Some(config.clone());
        Ok(config)
    }
}

// ── Runs ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRunRepo {
    runs: Mutex<HashMap<RunId, LifecycleRun>>,
    create_delay: Mutex<Option<Duration>>,
}

impl InMemoryRunRepo {
    pub fn slow_creates(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    pub fn running(&self) -> usize {
        self.runs
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.status == RunStatus::Running)
            .count()
    }

    pub fn all(&self) -> Vec<LifecycleRun> {
        self.runs.lock().unwrap().values().cloned().collect()
    }
}

impl RunRepository for InMemoryRunRepo {
    async fn create(&self, run: LifecycleRun) -> Result<LifecycleRun, AssetCycleError> {
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.runs.lock().unwrap().insert(run.id, run.clone());
        Ok(run)
    }

    async fn update(&self, run: LifecycleRun) -> Result<LifecycleRun, AssetCycleError> {
        self.runs.lock().unwrap().insert(run.id, run.clone());
        Ok(run)
    }

    async fn get_by_id(&self, id: RunId) -> Result<Option<LifecycleRun>, AssetCycleError> {
        Ok(self.runs.lock().unwrap().get(&id).cloned())
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<LifecycleRun>, AssetCycleError> {
        let mut runs = self.all();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit);
        Ok(runs)
    }

    async fn abandon_running(&self, at: Timestamp) -> Result<u64, AssetCycleError> {
        let mut runs = self.runs.lock().unwrap();
        let mut count = 0;
        for run in runs.values_mut().filter(|r| r.status == RunStatus::Running) {
            run.abandon(at);
            count += 1;
        }
        Ok(count)
    }
}
