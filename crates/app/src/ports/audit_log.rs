//! Audit log port — append-only trail of lifecycle transitions.

use std::future::Future;

use assetcycle_domain::audit::AuditLogEntry;
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::AssetId;

/// Append and query [`AuditLogEntry`] records.
pub trait AuditLog {
    /// Persist a new entry.
    fn append(
        &self,
        entry: AuditLogEntry,
    ) -> impl Future<Output = Result<AuditLogEntry, AssetCycleError>> + Send;

    /// Get the most recent entries, ordered newest-first.
    fn get_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AuditLogEntry>, AssetCycleError>> + Send;

    /// Entries for a single asset, ordered newest-first.
    fn find_by_asset(
        &self,
        asset_id: AssetId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AuditLogEntry>, AssetCycleError>> + Send;
}

impl<T: AuditLog + Send + Sync> AuditLog for std::sync::Arc<T> {
    fn append(
        &self,
        entry: AuditLogEntry,
    ) -> impl Future<Output = Result<AuditLogEntry, AssetCycleError>> + Send {
        (**self).append(entry)
    }

    fn get_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AuditLogEntry>, AssetCycleError>> + Send {
        (**self).get_recent(limit)
    }

    fn find_by_asset(
        &self,
        asset_id: AssetId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AuditLogEntry>, AssetCycleError>> + Send {
        (**self).find_by_asset(asset_id, limit)
    }
}
