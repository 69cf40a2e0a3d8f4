//! Lifecycle configuration service — the rule store read by every run.

use tokio::sync::RwLock;

use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::lifecycle::{LifecycleConfig, LifecycleConfigPatch};

use crate::ports::ConfigRepository;

/// Holds the current [`LifecycleConfig`] and persists validated updates.
///
/// Constructed once at startup and shared (via `Arc`) between the HTTP
/// layer and the scheduler.
pub struct LifecycleConfigService<R> {
    repo: R,
    current: RwLock<LifecycleConfig>,
}

impl<R: ConfigRepository> LifecycleConfigService<R> {
    /// Load the persisted configuration, saving defaults if none exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(repo))]
    pub async fn load(repo: R) -> Result<Self, AssetCycleError> {
        let current = if let Some(config) = repo.load().await? {
            config
        } else {
            tracing::info!("no lifecycle configuration stored, persisting defaults");
            repo.save(LifecycleConfig::default()).await?
        };

        Ok(Self {
            repo,
            current: RwLock::new(current),
        })
    }

    /// Snapshot of the current configuration.
    pub async fn get(&self) -> LifecycleConfig {
        self.current.read().await.clone()
    }

    /// Validate and merge `patch`, persist it, and return the new configuration.
    ///
    /// Updates are serialized. On any error the previous configuration stays
    /// in effect, both in memory and in storage.
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::Validation`] naming the offending field, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        patch: LifecycleConfigPatch,
    ) -> Result<LifecycleConfig, AssetCycleError> {
        let mut current = self.current.write().await;
        let merged = current.merged(&patch)?;
        let saved = self.repo.save(merged).await?;
        *current = saved.clone();
        tracing::info!(
            inactivity_threshold_days = saved.dead_stock.inactivity_threshold_days,
            dead_stock_duration_days = saved.disposal.dead_stock_duration_days,
            require_approval = saved.disposal.require_approval,
            "lifecycle configuration updated"
        );
        Ok(saved)
    }
}
