//! Change notifications published by the registry cache
//!
//! UI code subscribes through `RegistryCache::subscribe` and re-reads the
//! entries it cares about when an event arrives.

/// Messages sent from the cache to its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A lookup started for a registry number
    LookupStarted { registry_number: String },
    /// An entry was written with data or an error
    Updated { registry_number: String },
    /// Expired entries were removed
    Expired { removed: usize },
    /// The whole cache was emptied
    Cleared,
}

impl CacheEvent {
    /// Returns the registry number the event is about, if it concerns a single entry
    pub fn registry_number(&self) -> Option<&str> {
        match self {
            CacheEvent::LookupStarted { registry_number }
            | CacheEvent::Updated { registry_number } => Some(registry_number),
            CacheEvent::Expired { .. } | CacheEvent::Cleared => None,
        }
    }
}
