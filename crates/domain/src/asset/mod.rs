//! Asset — an inventory item tracked through its lifecycle.
//!
//! Assets are owned by the inventory system; the lifecycle engine only
//! reads them and rewrites the status-related fields described by
//! [`AssetPatch`].

mod status;

pub use status::{AssetStatus, UnknownStatus};

use serde::{Deserialize, Serialize};

use crate::error::{AssetCycleError, ValidationError};
use crate::id::AssetId;
use crate::time::{Timestamp, epoch};

/// An inventory asset as seen by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub category: String,
    pub status: AssetStatus,
    pub last_audit_date: Option<Timestamp>,
    pub last_activity_date: Option<Timestamp>,
    pub dead_stock_since: Option<Timestamp>,
    pub disposal_date: Option<Timestamp>,
    pub disposal_approved: Option<bool>,
}

impl Asset {
    /// Create a builder for constructing an [`Asset`].
    #[must_use]
    pub fn builder() -> AssetBuilder {
        AssetBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::Validation`] when `name` or `category` is empty.
    pub fn validate(&self) -> Result<(), AssetCycleError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::EmptyCategory.into());
        }
        Ok(())
    }

    /// Most recent sign of life: the later of the last audit and the last
    /// activity, or the epoch when neither is known.
    #[must_use]
    pub fn effective_last_activity(&self) -> Timestamp {
        [self.last_audit_date, self.last_activity_date]
            .into_iter()
            .flatten()
            .fold(epoch(), Timestamp::max)
    }

    /// Whether disposal has been explicitly approved.
    #[must_use]
    pub fn is_disposal_approved(&self) -> bool {
        self.disposal_approved.unwrap_or(false)
    }

    /// Apply a transition patch in place.
    pub fn apply(&mut self, patch: &AssetPatch) {
        self.status = patch.status;
        if let Some(ts) = patch.dead_stock_since {
            self.dead_stock_since = Some(ts);
        }
        if let Some(ts) = patch.disposal_date {
            self.disposal_date = Some(ts);
        }
    }
}

/// The status-related fields rewritten by a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPatch {
    pub status: AssetStatus,
    pub dead_stock_since: Option<Timestamp>,
    pub disposal_date: Option<Timestamp>,
}

impl AssetPatch {
    /// Patch moving an asset to [`AssetStatus::DeadStock`] at `now`.
    #[must_use]
    pub fn dead_stock(now: Timestamp) -> Self {
        Self {
            status: AssetStatus::DeadStock,
            dead_stock_since: Some(now),
            disposal_date: None,
        }
    }

    /// Patch moving an asset to [`AssetStatus::Disposed`] at `now`.
    #[must_use]
    pub fn disposal(now: Timestamp) -> Self {
        Self {
            status: AssetStatus::Disposed,
            dead_stock_since: None,
            disposal_date: Some(now),
        }
    }
}

/// Step-by-step builder for [`Asset`].
#[derive(Debug, Default)]
pub struct AssetBuilder {
    id: Option<AssetId>,
    name: Option<String>,
    category: Option<String>,
    status: Option<AssetStatus>,
    last_audit_date: Option<Timestamp>,
    last_activity_date: Option<Timestamp>,
    dead_stock_since: Option<Timestamp>,
    disposal_date: Option<Timestamp>,
    disposal_approved: Option<bool>,
}

impl AssetBuilder {
    #[must_use]
    pub fn id(mut self, id: AssetId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: AssetStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn last_audit_date(mut self, ts: Timestamp) -> Self {
        self.last_audit_date = Some(ts);
        self
    }

    #[must_use]
    pub fn last_activity_date(mut self, ts: Timestamp) -> Self {
        self.last_activity_date = Some(ts);
        self
    }

    #[must_use]
    pub fn dead_stock_since(mut self, ts: Timestamp) -> Self {
        self.dead_stock_since = Some(ts);
        self
    }

    #[must_use]
    pub fn disposal_date(mut self, ts: Timestamp) -> Self {
        self.disposal_date = Some(ts);
        self
    }

    #[must_use]
    pub fn disposal_approved(mut self, approved: bool) -> Self {
        self.disposal_approved = Some(approved);
        self
    }

    /// Consume the builder, validate, and return an [`Asset`].
    ///
    /// Status defaults to [`AssetStatus::Active`].
    ///
    /// # Errors
    ///
    /// Returns [`AssetCycleError::Validation`] if `name` or `category` is missing or empty.
    pub fn build(self) -> Result<Asset, AssetCycleError> {
        let asset = Asset {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            status: self.status.unwrap_or(AssetStatus::Active),
            last_audit_date: self.last_audit_date,
            last_activity_date: self.last_activity_date,
            dead_stock_since: self.dead_stock_since,
            disposal_date: self.disposal_date,
            disposal_approved: self.disposal_approved,
        };
        asset.validate()?;
        Ok(asset)
    }
}
