//! Cache entries and the keyed cache state

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::data::CompanyRecord;

/// Default time-to-live for every cache entry
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Mapping from registry number to its cache entry
pub type CacheState = HashMap<String, CacheEntry>;

/// State of a single registry number in the cache
///
/// An entry is in exactly one of these shapes:
/// - loading (`data` may still hold the previous record)
/// - resolved with `data`
/// - failed with `error`
/// - cleared: no data, no error, not loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Last successfully fetched record
    pub data: Option<CompanyRecord>,
    /// Whether a lookup is in progress
    pub loading: bool,
    /// Message from the last failed lookup
    pub error: Option<String>,
    /// When the entry was last written
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    /// Entry for a lookup that just started, carrying over previous data
    pub fn loading(previous: Option<CompanyRecord>, now: DateTime<Utc>) -> Self {
        Self {
            data: previous,
            loading: true,
            error: None,
            timestamp: now,
        }
    }

    /// Entry for a resolved lookup
    pub fn resolved(data: CompanyRecord, now: DateTime<Utc>) -> Self {
        Self {
            data: Some(data),
            loading: false,
            error: None,
            timestamp: now,
        }
    }

    /// Entry for a failed lookup
    pub fn failed(error: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            data: None,
            loading: false,
            error: Some(error.into()),
            timestamp: now,
        }
    }

    /// Returns true if the entry is older than `ttl` at `now`
    pub fn is_expired_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.timestamp > ttl
    }

    /// Returns the record if the entry holds data and is still fresh
    pub fn live_data(&self, ttl: Duration, now: DateTime<Utc>) -> Option<&CompanyRecord> {
        if self.is_expired_at(ttl, now) {
            return None;
        }
        self.data.as_ref()
    }
}

/// Snapshot counts over the cache state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of entries
    pub total: usize,
    /// Entries older than the TTL (not evicted by counting)
    pub expired: usize,
    /// Entries with a lookup in progress
    pub loading: usize,
    /// Entries holding an error
    pub errors: usize,
}

impl CacheStats {
    /// Counts entries in `state` against `ttl` at `now`
    pub fn collect(state: &CacheState, ttl: Duration, now: DateTime<Utc>) -> Self {
        state.values().fold(Self::default(), |mut stats, entry| {
            stats.total += 1;
            if entry.is_expired_at(ttl, now) {
                stats.expired += 1;
            }
            if entry.loading {
                stats.loading += 1;
            }
            if entry.error.is_some() {
                stats.errors += 1;
            }
            stats
        })
    }
}
