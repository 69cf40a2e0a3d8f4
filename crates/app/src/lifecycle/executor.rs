//! Transition executor — applies approved transitions one asset at a time.
//!
//! Each asset is moved with an optimistic compare-and-set on its current
//! status instead of a store-wide lock. A status mismatch means someone else
//! changed the asset since it was evaluated; it is skipped and left for the
//! next run. A storage failure aborts the rest of the batch, but assets
//! already committed keep their new state.
//!
//! A batch only ever stops between two assets: an asset's compare-and-set
//! and its audit entry are never separated by a deadline or a cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::time::Instant;

use assetcycle_domain::asset::{AssetPatch, AssetStatus};
use assetcycle_domain::audit::{AuditAction, AuditLogEntry};
use assetcycle_domain::error::AssetCycleError;
use assetcycle_domain::id::{AssetId, RunId};
use assetcycle_domain::lifecycle::{SkipReason, SkippedAsset};
use assetcycle_domain::time::Timestamp;

use crate::ports::{AssetStore, AuditLog};

/// Default number of assets processed between cooperative yields.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// The two transitions the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// `Active` → `DeadStock`.
    DeadStock,
    /// `DeadStock` → `Disposed`.
    Disposal,
}

impl TransitionKind {
    /// Status the asset must still have at write time.
    #[must_use]
    pub fn expected_status(self) -> AssetStatus {
        match self {
            Self::DeadStock => AssetStatus::Active,
            Self::Disposal => AssetStatus::DeadStock,
        }
    }

    #[must_use]
    pub fn patch(self, now: Timestamp) -> AssetPatch {
        match self {
            Self::DeadStock => AssetPatch::dead_stock(now),
            Self::Disposal => AssetPatch::disposal(now),
        }
    }

    #[must_use]
    pub fn audit_action(self) -> AuditAction {
        match self {
            Self::DeadStock => AuditAction::MovedToDeadStock,
            Self::Disposal => AuditAction::MovedToDisposal,
        }
    }
}

/// Who is moving the assets, and when.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    /// Recorded as `performed_by` on every audit entry.
    pub actor: String,
    /// Written into the asset's `dead_stock_since` / `disposal_date`.
    pub now: Timestamp,
    pub run_id: Option<RunId>,
}

/// Result of a transition batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub count: u64,
    pub moved_ids: Vec<AssetId>,
    pub skipped: Vec<SkippedAsset>,
    /// Moved assets whose audit entry could not be written.
    pub unaudited: Vec<AssetId>,
}

/// A storage failure stopped the batch part-way through.
#[derive(Debug, thiserror::Error)]
#[error("transition batch aborted after {} moved", .outcome.count)]
pub struct BatchAborted {
    /// What was committed before the failure.
    pub outcome: TransitionOutcome,
    #[source]
    pub source: AssetCycleError,
}

/// Why a batch stopped before its last candidate.
#[derive(Debug, thiserror::Error)]
pub enum Halt {
    #[error(transparent)]
    Storage(#[from] AssetCycleError),
    #[error("deadline reached")]
    DeadlineReached,
    #[error("cancelled")]
    Cancelled,
}

/// When a batch must stop. Consulted before each asset.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl StopSignal {
    /// Never stops.
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    /// Stops once `deadline` has passed or `cancelled` is raised.
    #[must_use]
    pub fn new(deadline: Instant, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Some(cancelled),
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// # Errors
    ///
    /// Returns [`Halt::Cancelled`] or [`Halt::DeadlineReached`] once the
    /// batch must not start another asset.
    pub fn check(&self) -> Result<(), Halt> {
        if self
            .cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
        {
            return Err(Halt::Cancelled);
        }
        if self.deadline.is_some_and(|at| Instant::now() >= at) {
            return Err(Halt::DeadlineReached);
        }
        Ok(())
    }
}

/// Moves assets between lifecycle states and records the audit trail.
pub struct TransitionExecutor<AS, AL> {
    assets: AS,
    audit: AL,
    chunk_size: usize,
}

impl<AS, AL> TransitionExecutor<AS, AL>
where
    AS: AssetStore,
    AL: AuditLog,
{
    /// Create a new executor writing to `assets` and `audit`.
    pub fn new(assets: AS, audit: AL) -> Self {
        Self {
            assets,
            audit,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Number of assets processed before yielding back to the runtime.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Move each still-`Active` asset in `ids` to dead stock.
    ///
    /// # Errors
    ///
    /// Returns [`BatchAborted`] with the partial outcome on a storage failure.
    pub async fn move_to_dead_stock(
        &self,
        ids: &[AssetId],
        ctx: &TransitionContext,
    ) -> Result<TransitionOutcome, BatchAborted> {
        self.run_batch(TransitionKind::DeadStock, ids, ctx).await
    }

    /// Move each still-`DeadStock` asset in `ids` to disposal.
    ///
    /// # Errors
    ///
    /// Returns [`BatchAborted`] with the partial outcome on a storage failure.
    pub async fn move_to_disposal(
        &self,
        ids: &[AssetId],
        ctx: &TransitionContext,
    ) -> Result<TransitionOutcome, BatchAborted> {
        self.run_batch(TransitionKind::Disposal, ids, ctx).await
    }

    async fn run_batch(
        &self,
        kind: TransitionKind,
        ids: &[AssetId],
        ctx: &TransitionContext,
    ) -> Result<TransitionOutcome, BatchAborted> {
        let mut outcome = TransitionOutcome::default();
        match self
            .apply(kind, ids, ctx, &StopSignal::never(), &mut outcome)
            .await
        {
            Err(Halt::Storage(source)) => Err(BatchAborted { outcome, source }),
            // `never` neither expires nor gets cancelled
            Ok(()) | Err(Halt::DeadlineReached | Halt::Cancelled) => Ok(outcome),
        }
    }

    /// Apply `kind` to every id, recording progress into `outcome` as it goes.
    ///
    /// `stop` is consulted before each asset, never between an asset's
    /// compare-and-set and its audit entry.
    ///
    /// # Errors
    ///
    /// Returns the storage error that stopped the batch, or the reason `stop`
    /// gave.
    #[tracing::instrument(skip_all, fields(kind = ?kind, candidates = ids.len()))]
    pub async fn apply(
        &self,
        kind: TransitionKind,
        ids: &[AssetId],
        ctx: &TransitionContext,
        stop: &StopSignal,
        outcome: &mut TransitionOutcome,
    ) -> Result<(), Halt> {
        for chunk in ids.chunks(self.chunk_size) {
            for &asset_id in chunk {
                stop.check()?;

                let swapped = self
                    .assets
                    .compare_and_update(asset_id, kind.expected_status(), kind.patch(ctx.now))
                    .await?;

                if !swapped {
                    tracing::warn!(%asset_id, ?kind, "asset changed concurrently, skipping");
                    outcome.skipped.push(SkippedAsset {
                        asset_id,
                        reason: SkipReason::ConcurrentModification,
                    });
                    continue;
                }

                outcome.count += 1;
                outcome.moved_ids.push(asset_id);
                tracing::debug!(%asset_id, ?kind, "asset transitioned");

                let entry = AuditLogEntry::at(
                    asset_id,
                    kind.audit_action(),
                    ctx.actor.clone(),
                    serde_json::json!({
                        "runId": ctx.run_id,
                        "from": kind.expected_status(),
                        "to": kind.patch(ctx.now).status,
                    }),
                    ctx.now,
                );
                if let Err(err) = self.audit.append(entry).await {
                    tracing::error!(%asset_id, "transition committed but audit entry was not written");
                    outcome.unaudited.push(asset_id);
                    return Err(err.into());
                }
            }
            tokio::task::yield_now().await;
        }
        Ok(())
    }
}
