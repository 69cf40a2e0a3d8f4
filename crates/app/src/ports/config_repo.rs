//! Configuration repository port — durable storage for lifecycle rules.

use std::future::Future;

use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::lifecycle::LifecycleConfig;

/// Load and save the single [`LifecycleConfig`] document.
pub trait ConfigRepository {
    /// The persisted configuration, or `None` if nothing was ever saved.
    fn load(&self) -> impl Future<Output = Result<Option<LifecycleConfig>, AssetCycleError>> + Send;

    /// Replace the persisted configuration.
    fn save(
        &self,
        config: LifecycleConfig,
    ) -> impl Future<Output = Result<LifecycleConfig, AssetCycleError>> + Send;
}
