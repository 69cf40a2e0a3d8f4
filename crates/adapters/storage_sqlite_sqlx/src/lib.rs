//! # assetcycle-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the port traits defined in `assetcycle-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `assetcycle-app` (for port traits) and `assetcycle-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod asset_store;
pub mod audit_log;
mod codec;
pub mod config_repo;
pub mod error;
pub mod pool;
pub mod run_repo;

pub use asset_store::SqliteAssetStore;
pub use audit_log::SqliteAuditLog;
pub use config_repo::SqliteConfigRepository;
pub use pool::{Config, Database};
pub use run_repo::SqliteRunRepository;
