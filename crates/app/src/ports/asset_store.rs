//! Asset store port — the inventory's asset records.
//!
//! The store is owned by the surrounding inventory system. The lifecycle
//! engine reads assets in bulk and rewrites their status fields through an
//! optimistic compare-and-set; it never creates or deletes assets.

use std::future::Future;

use assetcycle_domain::asset::{Asset, AssetPatch, AssetStatus};
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::AssetId;

/// Selection criteria for [`AssetStore::query_assets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetFilter {
    /// Only return assets currently in this status.
    pub status: Option<AssetStatus>,
}

impl AssetFilter {
    /// Match every asset.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match assets in `status`.
    #[must_use]
    pub fn with_status(status: AssetStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    /// Whether `asset` satisfies the filter.
    #[must_use]
    pub fn matches(&self, asset: &Asset) -> bool {
        self.status.is_none_or(|status| asset.status == status)
    }
}

/// Read and conditionally update [`Asset`]s.
pub trait AssetStore {
    /// Return every asset matching `filter`.
    fn query_assets(
        &self,
        filter: AssetFilter,
    ) -> impl Future<Output = Result<Vec<Asset>, AssetCycleError>> + Send;

    /// Get an asset by its unique identifier.
    fn get_by_id(
        &self,
        id: AssetId,
    ) -> impl Future<Output = Result<Option<Asset>, AssetCycleError>> + Send;

    /// Apply `patch` only if the asset's status is still `expected`.
    ///
    /// Returns `Ok(false)` when the asset is missing or its status changed;
    /// `Err` is reserved for storage failures.
    fn compare_and_update(
        &self,
        id: AssetId,
        expected: AssetStatus,
        patch: AssetPatch,
    ) -> impl Future<Output = Result<bool, AssetCycleError>> + Send;
}

impl<T: AssetStore + Send + Sync> AssetStore for std::sync::Arc<T> {
    fn query_assets(
        &self,
        filter: AssetFilter,
    ) -> impl Future<Output = Result<Vec<Asset>, AssetCycleError>> + Send {
        (**self).query_assets(filter)
    }

    fn get_by_id(
        &self,
        id: AssetId,
    ) -> impl Future<Output = Result<Option<Asset>, AssetCycleError>> + Send {
        (**self).get_by_id(id)
    }

    fn compare_and_update(
        &self,
        id: AssetId,
        expected: AssetStatus,
        patch: AssetPatch,
    ) -> impl Future<Output = Result<bool, AssetCycleError>> + Send {
        (**self).compare_and_update(id, expected, patch)
    }
}
