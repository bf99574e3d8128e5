//! Registry cache with request dedup and persistence
//!
//! `RegistryCache` is a cloneable handle. All clones share one state table,
//! one in-flight table and one persistence adapter, so a UI can hand the
//! same cache to every component that shows company names.
//!
//! # Lookup flow
//!
//! `get_company_data` checks, in order: the static test identifiers, the
//! live cache, the in-flight table, and finally the lookup service. Lookups
//! run as spawned tasks when a Tokio runtime is available and on the calling
//! task otherwise; every caller asking for the same registry number while one
//! is running awaits that same lookup.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{CacheEntry, CacheEvent, CacheState, CacheStats, CacheStore};
use crate::config::CacheConfig;
use crate::data::{
    has_registry_number_shape, is_test_registry_number, test_company_record, CompanyRecord,
    RegistryLookup,
};

/// Capacity of the change notification channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Handle to a running lookup, shared by every caller waiting on it
type InFlightLookup = Shared<BoxFuture<'static, Option<CompanyRecord>>>;

/// Entries and in-flight lookups, guarded together so that a hit check,
/// an in-flight check and a registration happen as one step
struct Tables {
    entries: CacheState,
    in_flight: HashMap<String, InFlightLookup>,
}

struct Inner {
    tables: Mutex<Tables>,
    lookup: Arc<dyn RegistryLookup>,
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    events: Mutex<Option<broadcast::Sender<CacheEvent>>>,
}

/// Client-side cache of registry lookups
///
/// Create one with [`RegistryCache::init`], share it by cloning, and call
/// [`RegistryCache::dispose`] when the session ends.
#[derive(Clone)]
pub struct RegistryCache {
    inner: Arc<Inner>,
}

impl RegistryCache {
    /// Creates a cache, hydrates it from `store` and drops expired entries
    ///
    /// # Arguments
    /// * `ttl` - How long an entry stays fresh
    /// * `lookup` - Service used for registry numbers that are not cached
    /// * `store` - Persistence adapter, read once here and written after every change
    pub fn init(
        ttl: Duration,
        lookup: Arc<dyn RegistryLookup>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cache = Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables {
                    entries: CacheState::new(),
                    in_flight: HashMap::new(),
                }),
                lookup,
                store,
                ttl,
                events: Mutex::new(Some(events)),
            }),
        };

        cache.hydrate();
        cache.clear_expired();
        cache
    }

    /// Creates a cache backed by the HTTP lookup client and the configured store
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::init(config.ttl, Arc::new(config.lookup_client()), config.store())
    }

    /// Time-to-live applied to every entry
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Loads persisted entries, skipping expired ones
    ///
    /// Persisted `loading` flags are reset: no lookup from a previous
    /// session can still be running.
    fn hydrate(&self) {
        let persisted = match self.inner.store.load() {
            Ok(Some(state)) => state,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "failed to load registry cache, starting empty");
                return;
            }
        };

        let now = Utc::now();
        let mut tables = self.inner.lock_tables();
        for (registry_number, mut entry) in persisted {
            if entry.is_expired_at(self.inner.ttl, now) {
                continue;
            }
            entry.loading = false;
            tables.entries.insert(registry_number, entry);
        }
        debug!(entries = tables.entries.len(), "hydrated registry cache");
    }

    /// Gets company data from the cache, or looks it up if not available
    ///
    /// Outside a Tokio runtime the lookup is driven by whichever caller is
    /// awaiting it, so it pauses while nobody awaits.
    ///
    /// # Returns
    /// * `Some(CompanyRecord)` - cached, mock or freshly looked-up record
    /// * `None` - empty or malformed registry number, or a failed lookup;
    ///   the failure message is left in [`RegistryCache::get_cache_entry`]
    pub async fn get_company_data(&self, registry_number: &str) -> Option<CompanyRecord> {
        if registry_number.is_empty() {
            return None;
        }

        if is_test_registry_number(registry_number) {
            return self.serve_test_record(registry_number);
        }

        if !has_registry_number_shape(registry_number) {
            debug!(registry_number, "ignoring registry number with invalid length");
            return None;
        }

        let lookup = {
            let mut tables = self.inner.lock_tables();
            let now = Utc::now();

            let cached = tables
                .entries
                .get(registry_number)
                .and_then(|entry| entry.live_data(self.inner.ttl, now));
            if let Some(record) = cached {
                debug!(registry_number, "registry cache hit");
                return Some(record.clone());
            }

            match tables.in_flight.get(registry_number) {
                Some(in_flight) => {
                    debug!(registry_number, "joining in-flight registry lookup");
                    in_flight.clone()
                }
                None => self.start_lookup(&mut tables, registry_number),
            }
        };

        lookup.await
    }

    /// Serves a test registry number from the cache or the mock table
    fn serve_test_record(&self, registry_number: &str) -> Option<CompanyRecord> {
        let now = Utc::now();
        let mut tables = self.inner.lock_tables();

        let cached = tables
            .entries
            .get(registry_number)
            .and_then(|entry| entry.live_data(self.inner.ttl, now));
        if let Some(record) = cached {
            return Some(record.clone());
        }

        let mock = test_company_record(registry_number)?;
        tables.entries.insert(
            registry_number.to_string(),
            CacheEntry::resolved(mock.clone(), now),
        );
        self.inner.persist(&tables.entries);
        drop(tables);

        debug!(registry_number, "serving mock record for test registry number");
        self.inner.notify(CacheEvent::Updated {
            registry_number: registry_number.to_string(),
        });
        Some(mock)
    }

    /// Marks the entry as loading and starts the lookup
    ///
    /// The caller holds the table lock, so the lookup cannot settle (and
    /// deregister itself) before it has been registered here.
    fn start_lookup(&self, tables: &mut Tables, registry_number: &str) -> InFlightLookup {
        let previous = tables
            .entries
            .get(registry_number)
            .and_then(|entry| entry.data.clone());
        tables.entries.insert(
            registry_number.to_string(),
            CacheEntry::loading(previous, Utc::now()),
        );

        let lookup = Arc::clone(&self.inner).run_lookup(registry_number.to_string());
        let in_flight = match Handle::try_current() {
            Ok(runtime) => {
                let task = runtime.spawn(lookup);
                async move { task.await.ok().flatten() }.boxed()
            }
            Err(_) => {
                debug!(registry_number, "no Tokio runtime, running lookup inline");
                AssertUnwindSafe(lookup)
                    .catch_unwind()
                    .map(|result| result.ok().flatten())
                    .boxed()
            }
        }
        .shared();

        tables
            .in_flight
            .insert(registry_number.to_string(), in_flight.clone());
        self.inner.notify(CacheEvent::LookupStarted {
            registry_number: registry_number.to_string(),
        });
        in_flight
    }

    /// Returns the current entry for a registry number, expired or not
    pub fn get_cache_entry(&self, registry_number: &str) -> Option<CacheEntry> {
        self.inner
            .lock_tables()
            .entries
            .get(registry_number)
            .cloned()
    }

    /// Returns true if a lookup is running or the entry is flagged as loading
    pub fn is_loading(&self, registry_number: &str) -> bool {
        let tables = self.inner.lock_tables();
        tables.in_flight.contains_key(registry_number)
            || tables
                .entries
                .get(registry_number)
                .is_some_and(|entry| entry.loading)
    }

    /// Returns true for test registry numbers and 8-character registry numbers
    pub fn should_fetch_company_name(&self, registry_number: &str) -> bool {
        should_fetch_company_name(registry_number)
    }

    /// Removes expired entries, persisting once if anything was removed
    ///
    /// # Returns
    /// The number of removed entries
    pub fn clear_expired(&self) -> usize {
        let now = Utc::now();
        let ttl = self.inner.ttl;
        let mut tables = self.inner.lock_tables();

        let before = tables.entries.len();
        tables
            .entries
            .retain(|_, entry| !entry.is_expired_at(ttl, now));
        let removed = before - tables.entries.len();

        if removed > 0 {
            self.inner.persist(&tables.entries);
            drop(tables);
            debug!(removed, "cleared expired registry cache entries");
            self.inner.notify(CacheEvent::Expired { removed });
        }
        removed
    }

    /// Empties the cache and persists the empty state
    ///
    /// Lookups already running are left alone and write their result into
    /// the emptied cache when they settle.
    pub fn clear_cache(&self) {
        let mut tables = self.inner.lock_tables();
        tables.entries.clear();
        self.inner.persist(&tables.entries);
        drop(tables);

        debug!("cleared registry cache");
        self.inner.notify(CacheEvent::Cleared);
    }

    /// Counts entries by state; expired entries are counted, not removed
    pub fn get_cache_stats(&self) -> CacheStats {
        let tables = self.inner.lock_tables();
        CacheStats::collect(&tables.entries, self.inner.ttl, Utc::now())
    }

    /// Subscribes to change notifications
    ///
    /// After [`RegistryCache::dispose`] the returned receiver is already closed.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        match self.inner.lock_events().as_ref() {
            Some(events) => events.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Flushes the cache to the store and closes the change stream
    ///
    /// The cache stays usable in memory; lookups still running will finish.
    pub fn dispose(&self) {
        {
            let tables = self.inner.lock_tables();
            self.inner.persist(&tables.entries);
        }
        self.inner.lock_events().take();
        debug!("disposed registry cache");
    }
}

impl std::fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.inner.lock_tables();
        f.debug_struct("RegistryCache")
            .field("ttl", &self.inner.ttl)
            .field("entries", &tables.entries.len())
            .field("in_flight", &tables.in_flight.len())
            .finish()
    }
}

impl Inner {
    fn lock_tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_events(&self) -> MutexGuard<'_, Option<broadcast::Sender<CacheEvent>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes the state through the store. Callers hold the table lock so
    /// snapshots reach the store in mutation order.
    fn persist(&self, entries: &CacheState) {
        if let Err(e) = self.store.save(entries) {
            warn!(error = %e, "failed to persist registry cache");
        }
    }

    fn notify(&self, event: CacheEvent) {
        if let Some(events) = self.lock_events().as_ref() {
            // No subscribers is fine.
            let _ = events.send(event);
        }
    }

    /// Body of a spawned lookup task
    async fn run_lookup(self: Arc<Self>, registry_number: String) -> Option<CompanyRecord> {
        let mut guard = InFlightGuard {
            inner: Arc::as_ref(&self),
            registry_number: &registry_number,
            settled: false,
        };

        debug!(registry_number = %registry_number, "looking up registry number");
        let result = self.lookup.lookup(&registry_number).await;
        let now = Utc::now();

        let mut tables = self.lock_tables();
        let record = match result {
            Ok(record) => {
                info!(
                    registry_number = %registry_number,
                    name = %record.name,
                    "cached registry lookup"
                );
                tables.entries.insert(
                    registry_number.clone(),
                    CacheEntry::resolved(record.clone(), now),
                );
                Some(record)
            }
            Err(e) => {
                warn!(registry_number = %registry_number, error = %e, "registry lookup failed");
                tables.entries.insert(
                    registry_number.clone(),
                    CacheEntry::failed(e.to_string(), now),
                );
                None
            }
        };
        tables.in_flight.remove(&registry_number);
        self.persist(&tables.entries);
        drop(tables);
        guard.settled = true;

        self.notify(CacheEvent::Updated {
            registry_number: registry_number.clone(),
        });
        record
    }
}

/// Deregisters a lookup whose task ended without settling (panic or abort)
/// and records the failure in its entry
struct InFlightGuard<'a> {
    inner: &'a Inner,
    registry_number: &'a str,
    settled: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let mut tables = self.inner.lock_tables();
        tables.in_flight.remove(self.registry_number);
        if let Some(entry) = tables.entries.get_mut(self.registry_number) {
            if entry.loading {
                *entry = CacheEntry::failed("Lookup did not complete", Utc::now());
            }
        }
        self.inner.persist(&tables.entries);
        drop(tables);

        warn!(
            registry_number = self.registry_number,
            "registry lookup ended without a result"
        );
        self.inner.notify(CacheEvent::Updated {
            registry_number: self.registry_number.to_string(),
        });
    }
}

/// Returns true for test registry numbers and 8-character registry numbers
///
/// UI code uses this to decide whether asking the cache is worthwhile at all.
pub fn should_fetch_company_name(registry_number: &str) -> bool {
    is_test_registry_number(registry_number) || has_registry_number_shape(registry_number)
}
