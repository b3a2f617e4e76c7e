//! HALCYON Cache - Expiring Relation Cache
//!
//! Shared, time-expiring store for hydrated resources and collections keyed
//! by resolved href, plus the background sweeper that purges expired
//! entries.

pub mod policy;
pub mod store;
pub mod sweeper;

pub use policy::CachePolicy;
pub use store::{CacheStats, CacheStore, EntryInfo};
pub use sweeper::{sweep_task, SweeperConfig, SweeperMetrics, SweeperSnapshot};
