// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TTL throttle cache, used to rate-limit typing-indicator passthrough.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Map of key -> expiry. Expired entries are swept on every lookup.
pub struct TtlCache<K> {
    entries: HashMap<K, DateTime<Utc>>,
}

impl<K: Eq + Hash> TtlCache<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert or refresh a key with the given time-to-live.
    pub fn insert(&mut self, key: K, now: DateTime<Utc>, ttl: Duration) {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(5));
        self.entries.insert(key, now + ttl);
    }

    /// True iff the key is present and unexpired.
    pub fn contains(&mut self, key: &K, now: DateTime<Utc>) -> bool {
        self.entries.retain(|_, expiry| *expiry > now);
        self.entries.contains_key(key)
    }
}

impl<K: Eq + Hash> Default for TtlCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire() {
        let mut cache = TtlCache::new();
        let now = Utc::now();
        cache.insert("k", now, Duration::from_secs(5));

        assert!(cache.contains(&"k", now));
        assert!(cache.contains(&"k", now + chrono::Duration::seconds(4)));
        assert!(!cache.contains(&"k", now + chrono::Duration::seconds(6)));
    }

    #[test]
    fn expired_entries_are_swept_on_lookup() {
        let mut cache = TtlCache::new();
        let now = Utc::now();
        cache.insert("a", now, Duration::from_secs(1));
        cache.insert("b", now, Duration::from_secs(60));

        let later = now + chrono::Duration::seconds(2);
        assert!(!cache.contains(&"a", later));
        assert_eq!(cache.entries.len(), 1);
    }
}
