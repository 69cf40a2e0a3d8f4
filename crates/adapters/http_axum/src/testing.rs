//! In-memory ports and request helpers for the handler tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

use assetcycle_app::lifecycle::{LifecycleScheduler, SchedulerSettings};
use assetcycle_app::ports::{AssetFilter, AssetStore, AuditLog, ConfigRepository, RunRepository};
use assetcycle_app::services::config_service::LifecycleConfigService;
use assetcycle_app::services::history_service::LifecycleHistoryService;
use assetcycle_app::services::stats_service::LifecycleStatsService;
use assetcycle_domain::asset::{Asset, AssetPatch, AssetStatus};
use assetcycle_domain::audit::AuditLogEntry;
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::{AssetId, RunId};
use assetcycle_domain::lifecycle::{LifecycleConfig, LifecycleRun, RunStatus};
use assetcycle_domain::time::{Timestamp, days, now};

use crate::state::AppState;

#[derive(Default)]
pub struct MemoryAssets {
    assets: Mutex<HashMap<AssetId, Asset>>,
    fail_queries: AtomicBool,
}

impl MemoryAssets {
    pub fn get(&self, id: AssetId) -> Asset {
        self.assets.lock().unwrap()[&id].clone()
    }

    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }
}

impl AssetStore for MemoryAssets {
    async fn query_assets(&self, filter: AssetFilter) -> Result<Vec<Asset>, AssetCycleError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AssetCycleError::Storage("store unreachable".into()));
        }
        let assets = self.assets.lock().unwrap();
        Ok(assets.values().filter(|a| filter.matches(a)).cloned().collect())
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
        let mut assets = self.assets.lock().unwrap();
        match assets.get_mut(&id) {
            Some(asset) if asset.status == expected => {
                asset.apply(&patch);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryAudit(Mutex<Vec<AuditLogEntry>>);

impl AuditLog for MemoryAudit {
    async fn append(&self, entry: AuditLogEntry) -> Result<AuditLogEntry, AssetCycleError> {
        self.0.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, AssetCycleError> {
        Ok(self.0.lock().unwrap().iter().rev().take(limit).cloned().collect())
    }

    async fn find_by_asset(
        &self,
        asset_id: AssetId,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AssetCycleError> {
        let entries = self.0.lock().unwrap();
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.asset_id == asset_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryConfig(Mutex<Option<LifecycleConfig>>);

impl ConfigRepository for MemoryConfig {
    async fn load(&self) -> Result<Option<LifecycleConfig>, AssetCycleError> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn save(&self, config: LifecycleConfig) -> Result<LifecycleConfig, AssetCycleError> {
        *self.0.lock().unwrap() = Some(config.clone());
        Ok(config)
    }
}

#[derive(Default)]
pub struct MemoryRuns(Mutex<HashMap<RunId, LifecycleRun>>);

impl RunRepository for MemoryRuns {
    async fn create(&self, run: LifecycleRun) -> Result<LifecycleRun, AssetCycleError> {
        self.0.lock().unwrap().insert(run.id, run.clone());
        Ok(run)
    }

    async fn update(&self, run: LifecycleRun) -> Result<LifecycleRun, AssetCycleError> {
        self.0.lock().unwrap().insert(run.id, run.clone());
        Ok(run)
    }

    async fn get_by_id(&self, id: RunId) -> Result<Option<LifecycleRun>, AssetCycleError> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<LifecycleRun>, AssetCycleError> {
        let mut runs: Vec<_> = self.0.lock().unwrap().values().cloned().collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit);
        Ok(runs)
    }

    async fn abandon_running(&self, at: Timestamp) -> Result<u64, AssetCycleError> {
        let mut runs = self.0.lock().unwrap();
        let mut count = 0;
        for run in runs.values_mut().filter(|r| r.status == RunStatus::Running) {
            run.abandon(at);
            count += 1;
        }
        Ok(count)
    }
}

pub struct TestApp {
    pub assets: Arc<MemoryAssets>,
    router: Router,
}

impl TestApp {
    pub async fn new(assets: Vec<Asset>) -> Self {
        Self::with_cooldown(assets, Duration::ZERO).await
    }

    pub async fn with_cooldown(assets: Vec<Asset>, cooldown: Duration) -> Self {
        let store = Arc::new(MemoryAssets::default());
        store
            .assets
            .lock()
            .unwrap()
            .extend(assets.into_iter().map(|a| (a.id, a)));
        let audit = Arc::new(MemoryAudit::default());
        let runs = Arc::new(MemoryRuns::default());
        let config = Arc::new(
            LifecycleConfigService::load(MemoryConfig::default())
                .await
                .unwrap(),
        );
        let scheduler = LifecycleScheduler::new(
            Arc::clone(&store),
            Arc::clone(&audit),
            Arc::clone(&runs),
            Arc::clone(&config),
            SchedulerSettings {
                cooldown,
                ..SchedulerSettings::default()
            },
        );
        let state = AppState::from_arcs(
            Arc::clone(&config),
            Arc::new(scheduler),
            Arc::new(LifecycleStatsService::new(Arc::clone(&store), config)),
            Arc::new(LifecycleHistoryService::new(Arc::clone(&store), audit, runs)),
        );

        Self {
            assets: store,
            router: crate::router::build(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Active laptop last seen `inactive_days` ago.
pub fn asset(inactive_days: u32) -> Asset {
    Asset::builder()
        .name("Laptop")
        .category("Laptop")
        .last_activity_date(now() - days(inactive_days))
        .build()
        .unwrap()
}

/// Projector sitting in dead stock for `since_days`.
pub fn dead_stock(since_days: u32) -> Asset {
    Asset::builder()
        .name("Projector")
        .category("AV")
        .status(AssetStatus::DeadStock)
        .dead_stock_since(now() - days(since_days))
        .build()
        .unwrap()
}
