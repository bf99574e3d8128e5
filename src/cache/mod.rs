//! Cache module for registry lookups
//!
//! This module provides the `RegistryCache`, which keys company records by
//! registry number, collapses concurrent lookups for the same number into a
//! single request, expires entries after a TTL and persists its state through
//! a pluggable `CacheStore`.

mod entry;
mod events;
mod registry;
mod store;

pub use entry::{CacheEntry, CacheState, CacheStats, DEFAULT_TTL_HOURS};
pub use events::CacheEvent;
pub use registry::{should_fetch_company_name, RegistryCache};
pub use store::{CacheStore, FileCacheStore, NoopCacheStore, StoreError, CACHE_FILE_NAME};
