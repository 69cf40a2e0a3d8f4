//! Run repository port — history of lifecycle runs.

use std::future::Future;

use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::RunId;
use assetcycle_domain::lifecycle::LifecycleRun;
use assetcycle_domain::time::Timestamp;

/// Persist and query [`LifecycleRun`] summaries.
pub trait RunRepository {
    /// Record a freshly started run.
    fn create(
        &self,
        run: LifecycleRun,
    ) -> impl Future<Output = Result<LifecycleRun, AssetCycleError>> + Send;

    /// Overwrite a run's summary (counts, status, bounds).
    fn update(
        &self,
        run: LifecycleRun,
    ) -> impl Future<Output = Result<LifecycleRun, AssetCycleError>> + Send;

    /// Get a run by its unique identifier.
    fn get_by_id(
        &self,
        id: RunId,
    ) -> impl Future<Output = Result<Option<LifecycleRun>, AssetCycleError>> + Send;

    /// The most recent runs, newest-first.
    fn get_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LifecycleRun>, AssetCycleError>> + Send;

    /// Mark every run still `Running` as `Abandoned`, returning how many were.
    fn abandon_running(
        &self,
        at: Timestamp,
    ) -> impl Future<Output = Result<u64, AssetCycleError>> + Send;
}
