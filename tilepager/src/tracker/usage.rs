//! Usage tracker backed by a generational arena.

use slotmap::{new_key_type, SlotMap};
use tracing::{trace, warn};

use crate::coord::ResourceKey;

new_key_type! {
    /// Positional handle to a tracked entry.
    ///
    /// Holders may use it for O(1) refreshes without a key lookup. The token
    /// is invalidated once its entry is swept or the tracker is cleared; a
    /// stale token never resolves to another entry.
    pub struct UsageToken;
}

#[derive(Debug)]
struct UsageEntry<K, T> {
    key: K,
    payload: T,
    /// Cycle of the most recent touch.
    touched: u64,
}

/// Tracks which entries were used during the current cycle.
///
/// Not internally synchronized: the owner drives `touch` and `sweep` from
/// its update phase, and exclusive access is enforced by `&mut self`.
#[derive(Debug)]
pub struct UsageTracker<K, T> {
    entries: SlotMap<UsageToken, UsageEntry<K, T>>,
    /// Cycle stamped onto entries touched now. Advanced by every sweep.
    cycle: u64,
}

impl<K: ResourceKey, T> UsageTracker<K, T> {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tracker with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotMap::with_capacity_and_key(capacity),
            cycle: 0,
        }
    }

    /// Marks an entry as used this cycle, creating it if necessary.
    ///
    /// With `token == None` a new entry is created from `make_payload` and
    /// its token returned. With a live token the entry is refreshed and the
    /// same token returned; `make_payload` is not called.
    ///
    /// Passing a token whose entry was already swept is a caller bug. Debug
    /// builds assert; release builds create a fresh entry.
    pub fn touch<F>(&mut self, key: K, token: Option<UsageToken>, make_payload: F) -> UsageToken
    where
        F: FnOnce() -> T,
    {
        if let Some(token) = token {
            if self.refresh(token) {
                return token;
            }
            debug_assert!(false, "touch() with a stale usage token for {:?}", key);
            warn!(key = ?key, "Stale usage token, tracking as a new entry");
        }
        self.insert(key, make_payload())
    }

    /// Inserts a new entry, already marked as used this cycle.
    pub fn insert(&mut self, key: K, payload: T) -> UsageToken {
        self.entries.insert(UsageEntry {
            key,
            payload,
            touched: self.cycle,
        })
    }

    /// Marks an existing entry as used this cycle.
    ///
    /// Returns `false` if the token is stale.
    #[inline]
    pub fn refresh(&mut self, token: UsageToken) -> bool {
        match self.entries.get_mut(token) {
            Some(entry) => {
                entry.touched = self.cycle;
                true
            }
            None => false,
        }
    }

    /// Offers every entry not touched since the previous sweep to `dispose`.
    ///
    /// Entries for which `dispose` returns `true` are removed, their tokens
    /// invalidated, and returned by value. Stops after `max_count` removals;
    /// stale entries left over (or rejected by `dispose`) are offered again
    /// at the next sweep. Offer order among stale entries is unspecified.
    ///
    /// Afterwards the cycle advances, so entries touched before this call
    /// must be touched again before the next sweep to survive it.
    pub fn sweep<F>(&mut self, max_count: usize, mut dispose: F) -> Vec<(K, T)>
    where
        F: FnMut(&K, &mut T) -> bool,
    {
        let threshold = self.cycle;
        let stale: Vec<UsageToken> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.touched < threshold)
            .map(|(token, _)| token)
            .collect();

        let mut removed = Vec::new();
        for token in stale {
            if removed.len() >= max_count {
                break;
            }
            let accepted = match self.entries.get_mut(token) {
                Some(entry) => dispose(&entry.key, &mut entry.payload),
                None => false,
            };
            if accepted {
                if let Some(entry) = self.entries.remove(token) {
                    removed.push((entry.key, entry.payload));
                }
            }
        }

        trace!(
            cycle = self.cycle,
            removed = removed.len(),
            remaining = self.entries.len(),
            "Usage sweep complete"
        );

        self.cycle += 1;
        removed
    }

    /// Sweeps with a disposer that accepts every stale entry.
    pub fn sweep_all(&mut self, max_count: usize) -> Vec<(K, T)> {
        self.sweep(max_count, |_, _| true)
    }

    /// Removes a single entry regardless of when it was last touched.
    pub fn remove(&mut self, token: UsageToken) -> Option<(K, T)> {
        self.entries
            .remove(token)
            .map(|entry| (entry.key, entry.payload))
    }

    /// Drops every entry and invalidates every outstanding token.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, token: UsageToken) -> Option<&T> {
        self.entries.get(token).map(|entry| &entry.payload)
    }

    pub fn get_mut(&mut self, token: UsageToken) -> Option<&mut T> {
        self.entries.get_mut(token).map(|entry| &mut entry.payload)
    }

    /// Returns the key the entry was created with.
    pub fn key_of(&self, token: UsageToken) -> Option<&K> {
        self.entries.get(token).map(|entry| &entry.key)
    }

    /// Returns true if `token` still refers to a tracked entry.
    pub fn contains(&self, token: UsageToken) -> bool {
        self.entries.contains_key(token)
    }

    /// Returns true if the entry was touched during the current cycle.
    pub fn is_current(&self, token: UsageToken) -> bool {
        self.entries
            .get(token)
            .is_some_and(|entry| entry.touched == self.cycle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of sweeps performed so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.values().map(|entry| &entry.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UsageToken, &K, &T)> + '_ {
        self.entries
            .iter()
            .map(|(token, entry)| (token, &entry.key, &entry.payload))
    }
}

impl<K: ResourceKey, T> Default for UsageTracker<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn touch_key(
        tracker: &mut UsageTracker<char, String>,
        tokens: &mut HashMap<char, UsageToken>,
        key: char,
    ) {
        let token = tracker.touch(key, tokens.get(&key).copied(), || key.to_string());
        tokens.insert(key, token);
    }

    fn present(tracker: &UsageTracker<char, String>) -> BTreeSet<char> {
        tracker.keys().copied().collect()
    }

    #[test]
    fn test_touch_creates_entry_once() {
        let mut tracker = UsageTracker::new();
        let calls = AtomicUsize::new(0);

        let first = tracker.touch('a', None, || {
            calls.fetch_add(1, Ordering::SeqCst);
            1
        });
        let second = tracker.touch('a', Some(first), || {
            calls.fetch_add(1, Ordering::SeqCst);
            2
        });

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.get(first), Some(&1));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_new_entries_survive_their_first_sweep() {
        let mut tracker = UsageTracker::new();
        let token = tracker.insert('a', ());

        assert!(tracker.sweep_all(10).is_empty());
        assert!(tracker.contains(token));
    }

    #[test]
    fn test_sweep_removes_only_untouched() {
        let mut tracker = UsageTracker::new();
        let mut tokens = HashMap::new();

        // Cycle 0: A, B, C all visible
        for key in ['A', 'B', 'C'] {
            touch_key(&mut tracker, &mut tokens, key);
        }
        assert!(tracker.sweep_all(10).is_empty());

        // Cycle 1: only A and C visible
        touch_key(&mut tracker, &mut tokens, 'A');
        touch_key(&mut tracker, &mut tokens, 'C');
        let removed = tracker.sweep_all(10);

        assert_eq!(removed, vec![('B', "B".to_string())]);
        assert_eq!(present(&tracker), BTreeSet::from(['A', 'C']));
        assert!(!tracker.contains(tokens[&'B']));
    }

    #[test]
    fn test_second_sweep_without_touches_finds_nothing_new() {
        let mut tracker = UsageTracker::new();
        let mut tokens = HashMap::new();
        for key in ['A', 'B'] {
            touch_key(&mut tracker, &mut tokens, key);
        }
        tracker.sweep_all(10);

        // Nothing touched during the next cycle: both become stale once
        let first = tracker.sweep_all(10);
        assert_eq!(first.len(), 2);

        let second = tracker.sweep_all(10);
        assert!(second.is_empty());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_max_count_defers_remaining_stale_entries() {
        let mut tracker = UsageTracker::new();
        for key in ['A', 'B', 'C', 'D'] {
            tracker.insert(key, key.to_string());
        }
        tracker.sweep_all(10);

        assert_eq!(tracker.sweep_all(3).len(), 3);
        assert_eq!(tracker.len(), 1);

        // Still stale at the next sweep
        assert_eq!(tracker.sweep_all(3).len(), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_rejected_entries_are_offered_again() {
        let mut tracker = UsageTracker::new();
        let token = tracker.insert('A', 0u32);
        tracker.sweep_all(10);

        let removed = tracker.sweep(10, |_, offers| {
            *offers += 1;
            false
        });
        assert!(removed.is_empty());
        assert_eq!(tracker.get(token), Some(&1));

        let removed = tracker.sweep(10, |_, offers| {
            *offers += 1;
            *offers >= 2
        });
        assert_eq!(removed, vec![('A', 2)]);
    }

    #[test]
    fn test_refresh_with_stale_token_fails() {
        let mut tracker = UsageTracker::new();
        let token = tracker.insert('A', ());
        tracker.remove(token);

        assert!(!tracker.refresh(token));
        assert_eq!(tracker.get(token), None);
        assert_eq!(tracker.key_of(token), None);
    }

    #[test]
    fn test_stale_token_does_not_alias_reused_slot() {
        let mut tracker = UsageTracker::new();
        let old = tracker.insert('A', 1);
        tracker.remove(old);
        let new = tracker.insert('B', 2);

        assert_ne!(old, new);
        assert_eq!(tracker.get(old), None);
        assert_eq!(tracker.get(new), Some(&2));
    }

    #[test]
    fn test_is_current_tracks_cycle() {
        let mut tracker = UsageTracker::new();
        let token = tracker.insert('A', ());
        assert!(tracker.is_current(token));

        tracker.sweep_all(10);
        assert!(!tracker.is_current(token));
        assert_eq!(tracker.cycle(), 1);

        tracker.refresh(token);
        assert!(tracker.is_current(token));
    }

    #[test]
    fn test_clear_drops_all_payloads() {
        let drops = Arc::new(());
        let mut tracker = UsageTracker::new();
        let token = tracker.insert('A', Arc::clone(&drops));
        tracker.insert('B', Arc::clone(&drops));
        assert_eq!(Arc::strong_count(&drops), 3);

        tracker.clear();
        assert_eq!(Arc::strong_count(&drops), 1);
        assert!(!tracker.contains(token));
    }

    #[test]
    fn test_teardown_drops_all_payloads() {
        let drops = Arc::new(());
        {
            let mut tracker = UsageTracker::new();
            tracker.insert('A', Arc::clone(&drops));
            tracker.insert('B', Arc::clone(&drops));
        }
        assert_eq!(Arc::strong_count(&drops), 1);
    }

    proptest! {
        /// Property: an entry touched during a cycle is never evicted by that cycle's sweep.
        #[test]
        fn prop_touched_entries_survive_sweep(
            cycles in prop::collection::vec(prop::collection::btree_set(0u8..32, 0..16), 1..12),
            max_count in 1usize..40,
        ) {
            let mut tracker = UsageTracker::<u8, u8>::new();
            let mut tokens: HashMap<u8, UsageToken> = HashMap::new();

            for touched in cycles {
                for key in &touched {
                    let token = tracker.touch(*key, tokens.get(key).copied(), || *key);
                    tokens.insert(*key, token);
                }

                for (key, payload) in tracker.sweep_all(max_count) {
                    prop_assert!(!touched.contains(&key));
                    prop_assert_eq!(key, payload);
                    tokens.remove(&key);
                }

                for key in &touched {
                    prop_assert!(tracker.contains(tokens[key]));
                }
                prop_assert_eq!(tracker.len(), tokens.len());
            }
        }
    }
}
