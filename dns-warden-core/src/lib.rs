//! # dns-warden-core
//!
//! The reconciliation engine behind dns-warden: keeps DNS records at an
//! external provider synchronized with a desired state derived from running
//! containers and administrative overrides.
//!
//! Responsibilities:
//! - batch reconciliation (classify against a cache snapshot, apply
//!   creates-then-updates with per-record error isolation)
//! - ownership/orphan tracking with grace-period cleanup
//! - provider hot-swap with init-before-activate semantics
//! - typed engine events over a broadcast channel
//!
//! The provider contract and concrete clients live in
//! [`dns_warden_provider`]; this crate plugs desired-state inputs (the
//! [`traits::DesiredStateSource`] seam) into that contract.

pub mod cleanup;
pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod ip;
pub mod manager;
pub mod preserve;
pub mod reconciler;
pub mod service;
pub mod tracker;
pub mod traits;
pub mod types;

pub mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use events::{EngineEvent, EventBus};
pub use service::EngineService;
pub use traits::{
    DesiredStateSource, JsonFileTrackerRepository, MemoryTrackerRepository, TrackerRepository,
};
pub use types::{CleanupReport, CycleSummary, OrphanedRecord, RecordSource, RecordSpec};
