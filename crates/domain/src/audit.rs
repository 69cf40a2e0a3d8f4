//! Audit log entries — one per committed lifecycle transition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::{AssetId, AuditEntryId};
use crate::time::{Timestamp, now};

/// The transition an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    MovedToDeadStock,
    MovedToDisposal,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MovedToDeadStock => "moved_to_dead_stock",
            Self::MovedToDisposal => "moved_to_disposal",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown audit action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audit action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for AuditAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "moved_to_dead_stock" => Ok(Self::MovedToDeadStock),
            "moved_to_disposal" => Ok(Self::MovedToDisposal),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// An immutable record of a status change performed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: AuditEntryId,
    pub asset_id: AssetId,
    pub action: AuditAction,
    /// System or actor identifier that caused the change.
    pub performed_by: String,
    pub details: serde_json::Value,
    pub timestamp: Timestamp,
}

impl AuditLogEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(
        asset_id: AssetId,
        action: AuditAction,
        performed_by: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::at(asset_id, action, performed_by, details, now())
    }

    /// Create an entry with an explicit timestamp.
    #[must_use]
    pub fn at(
        asset_id: AssetId,
        action: AuditAction,
        performed_by: impl Into<String>,
        details: serde_json::Value,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            asset_id,
            action,
            performed_by: performed_by.into(),
            details,
            timestamp,
        }
    }
}
