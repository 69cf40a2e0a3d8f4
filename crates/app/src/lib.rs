//! # assetcycle-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AssetStore` — query assets, compare-and-set their lifecycle status
//!   - `AuditLog` — append & query audit entries
//!   - `ConfigRepository` — load & save the lifecycle rules
//!   - `RunRepository` — record run summaries
//! - Define **driving/inbound ports** as use-case structs:
//!   - `LifecycleConfigService` — read and update the rules
//!   - `LifecycleScheduler` — manual and periodic runs, one at a time
//!   - `LifecycleStatsService` / `LifecycleHistoryService` — read-only reporting
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `assetcycle-domain` only (plus `tokio` for the run guard and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod lifecycle;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
