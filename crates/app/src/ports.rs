//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod asset_store;
pub mod audit_log;
pub mod config_repo;
pub mod run_repo;

pub use asset_store::{AssetFilter, AssetStore};
pub use audit_log::AuditLog;
pub use config_repo::ConfigRepository;
pub use run_repo::RunRepository;
