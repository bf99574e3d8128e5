//! Estonian Business Registry cache
//!
//! Client-side cache for registry lookups: deduplicates concurrent lookups
//! per registry number, persists results across sessions, expires entries
//! after a TTL and serves fixed mock companies for test registry numbers.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;

pub use cache::{CacheEntry, CacheEvent, CacheStats, RegistryCache};
pub use config::CacheConfig;
pub use data::{CompanyRecord, RegistryLookup};
