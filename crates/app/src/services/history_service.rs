//! History service — run summaries and the audit trail.

use std::sync::Arc;

use assetcycle_domain::audit::AuditLogEntry;
use assetcycle_domain::error::{AssetCycleError, NotFoundError};
use assetcycle_domain::id::{AssetId, RunId};
use assetcycle_domain::lifecycle::LifecycleRun;

use crate::ports::{AssetStore, AuditLog, RunRepository};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 50;

/// Largest page a single call may return.
pub const MAX_LIMIT: usize = 500;

/// Read-only access to past runs and audit entries.
pub struct LifecycleHistoryService<AS, AL, RR> {
    assets: Arc<AS>,
    audit: Arc<AL>,
    runs: Arc<RR>,
}

impl<AS, AL, RR> LifecycleHistoryService<AS, AL, RR>
where
    AS: AssetStore,
    AL: AuditLog,
    RR: RunRepository,
{
    pub fn new(assets: Arc<AS>, audit: Arc<AL>, runs: Arc<RR>) -> Self {
        Self {
            assets,
            audit,
            runs,
        }
    }

    /// Most recent runs first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the run repository.
    pub async fn list_runs(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LifecycleRun>, AssetCycleError> {
        self.runs.get_recent(clamp(limit)).await
    }

    /// Look up a run by id, e.g. to poll one still in progress.
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::NotFound`] when no run with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_run(&self, id: RunId) -> Result<LifecycleRun, AssetCycleError> {
        self.runs.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "LifecycleRun",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Latest audit entries across all assets.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the audit log.
    pub async fn recent_audit(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<AuditLogEntry>, AssetCycleError> {
        self.audit.get_recent(clamp(limit)).await
    }

    /// Audit trail of one asset, latest first.
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::NotFound`] if the asset does not exist,
    /// or a storage error.
    pub async fn audit_for_asset(
        &self,
        asset_id: AssetId,
        limit: Option<usize>,
    ) -> Result<Vec<AuditLogEntry>, AssetCycleError> {
        if self.assets.get_by_id(asset_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "Asset",
                id: asset_id.to_string(),
            }
            .into());
        }
        self.audit.find_by_asset(asset_id, clamp(limit)).await
    }
}

fn clamp(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryAssetStore, InMemoryAuditLog, InMemoryRunRepo};
    use assetcycle_domain::asset::Asset;
    use assetcycle_domain::audit::AuditAction;
    use assetcycle_domain::lifecycle::{RunPhases, TriggerType};
    use assetcycle_domain::time::{days, now};

    type Service = LifecycleHistoryService<InMemoryAssetStore, InMemoryAuditLog, InMemoryRunRepo>;

    fn service(assets: Vec<Asset>) -> Service {
        LifecycleHistoryService::new(
            Arc::new(InMemoryAssetStore::with(assets)),
            Arc::new(InMemoryAuditLog::default()),
            Arc::new(InMemoryRunRepo::default()),
        )
    }

    fn laptop() -> Asset {
        Asset::builder()
            .name("Laptop")
            .category("Laptop")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_return_not_found_when_run_unknown() {
        let svc = service(vec![]);
        let result = svc.get_run(RunId::new()).await;
        assert!(matches!(result, Err(AssetCycleError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_list_runs_latest_first() {
        let svc = service(vec![]);
        let older = LifecycleRun::start(
            TriggerType::Scheduled,
            None,
            RunPhases::Full,
            now() - days(1),
        );
        let newer = LifecycleRun::start(TriggerType::Manual, None, RunPhases::DeadStock, now());
        svc.runs.create(older.clone()).await.unwrap();
        svc.runs.create(newer.clone()).await.unwrap();

        let runs = svc.list_runs(None).await.unwrap();

        assert_eq!(runs.iter().map(|r| r.id).collect::<Vec<_>>(), [newer.id, older.id]);
        assert_eq!(svc.get_run(older.id).await.unwrap(), older);
        assert_eq!(svc.list_runs(Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_return_not_found_when_auditing_unknown_asset() {
        let svc = service(vec![]);
        let result = svc.audit_for_asset(AssetId::new(), None).await;
        assert!(matches!(result, Err(AssetCycleError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_filter_audit_by_asset() {
        let (a, b) = (laptop(), laptop());
        let svc = service(vec![a.clone(), b.clone()]);
        for id in [a.id, b.id, a.id] {
            svc.audit
                .append(AuditLogEntry::new(
                    id,
                    AuditAction::MovedToDeadStock,
                    "system",
                    serde_json::Value::Null,
                ))
                .await
                .unwrap();
        }

        let entries = svc.audit_for_asset(a.id, None).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.asset_id == a.id));
        assert_eq!(svc.recent_audit(Some(2)).await.unwrap().len(), 2);
    }

    #[test]
    fn should_clamp_limits_into_range() {
        assert_eq!(clamp(None), DEFAULT_LIMIT);
        assert_eq!(clamp(Some(0)), 1);
        assert_eq!(clamp(Some(10_000)), MAX_LIMIT);
    }
}
