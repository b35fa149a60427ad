//! Bounded memory of permission IDs that were already answered.
//!
//! Events for the same permission can arrive more than once (replays, a
//! re-list after enabling auto-accept). Entries are ordered by last sight;
//! pruning drops expired entries from the old end, then trims to the cap.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};

pub const RESPONDED_TTL_SECS: i64 = 60 * 60;
pub const MAX_RESPONDED: usize = 1000;

#[derive(Debug)]
pub struct RespondedCache {
    order: BTreeMap<u64, (String, DateTime<Utc>)>,
    index: HashMap<String, u64>,
    next_seq: u64,
    ttl: Duration,
    max_entries: usize,
}

impl Default for RespondedCache {
    fn default() -> Self {
        Self::new(Duration::seconds(RESPONDED_TTL_SECS), MAX_RESPONDED)
    }
}

impl RespondedCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            order: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
            ttl,
            max_entries,
        }
    }

    /// Records `id` as seen at `now` and returns whether it was already present.
    pub fn mark(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let hit = self.forget(id);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, (id.to_string(), now));
        self.index.insert(id.to_string(), seq);

        self.prune(now);
        hit
    }

    /// Removes `id`, returning whether it was present.
    pub fn forget(&mut self, id: &str) -> bool {
        match self.index.remove(id) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        while let Some(entry) = self.order.first_entry() {
            let (_, seen_at) = entry.get();
            if now.signed_duration_since(*seen_at) < self.ttl {
                break;
            }
            let (id, _) = entry.remove();
            self.index.remove(&id);
        }

        while self.order.len() > self.max_entries {
            let Some((_, (id, _))) = self.order.pop_first() else {
                break;
            };
            self.index.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).expect("valid timestamp")
    }

    #[test]
    fn first_mark_is_a_miss_then_hits() {
        let mut cache = RespondedCache::default();
        assert!(!cache.mark("perm-1", at(0)));
        assert!(cache.mark("perm-1", at(1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn forget_allows_a_retry() {
        let mut cache = RespondedCache::default();
        cache.mark("perm-1", at(0));
        assert!(cache.forget("perm-1"));
        assert!(!cache.forget("perm-1"));
        assert!(!cache.mark("perm-1", at(1)));
    }

    #[test]
    fn expired_entries_are_pruned() {
        let mut cache = RespondedCache::new(Duration::seconds(10), 100);
        cache.mark("old", at(0));
        cache.mark("fresh", at(5));

        cache.mark("new", at(10));
        assert!(!cache.contains("old"));
        assert!(cache.contains("fresh"));
        assert!(cache.contains("new"));
    }

    #[test]
    fn re_marking_refreshes_expiry() {
        let mut cache = RespondedCache::new(Duration::seconds(10), 100);
        cache.mark("a", at(0));
        cache.mark("b", at(1));
        cache.mark("a", at(8));

        // "b" is now the oldest and expires first.
        cache.mark("c", at(11));
        assert!(!cache.contains("b"));
        assert!(cache.contains("a"));
    }

    #[test]
    fn trims_oldest_when_over_capacity() {
        let mut cache = RespondedCache::new(Duration::seconds(3600), 3);
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            cache.mark(id, at(i as i64));
        }

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn recently_seen_entry_survives_trim() {
        let mut cache = RespondedCache::new(Duration::seconds(3600), 2);
        cache.mark("a", at(0));
        cache.mark("b", at(1));
        cache.mark("a", at(2));
        cache.mark("c", at(3));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn default_limits() {
        let mut cache = RespondedCache::default();
        for i in 0..(MAX_RESPONDED + 5) {
            cache.mark(&format!("perm-{i}"), at(0));
        }
        assert_eq!(cache.len(), MAX_RESPONDED);
        assert!(!cache.contains("perm-0"));

        cache.mark("late", at(RESPONDED_TTL_SECS));
        assert_eq!(cache.len(), 1);
    }
}
