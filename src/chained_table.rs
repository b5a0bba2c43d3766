//! ChainedTable: string-keyed separate chaining over a generational slot arena.
//!
//! Buckets hold the arena key of their chain head and every entry holds the
//! arena key of its successor, so unlinking is index relinking rather than
//! pointer surgery. The bucket count is fixed at construction.

use crate::djb2::Djb2State;
use crate::Cleanup;
use core::fmt;
use core::hash::{BuildHasher, Hasher};
use core::ops::ControlFlow;
use log::debug;
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

/// Bucket count used when a table is created with a hint of zero.
pub const DEFAULT_BUCKETS: usize = 1000;

new_key_type! {
    struct EntryKey;
}

/// Stable reference to a table entry. Stale handles never resolve, even if
/// the arena slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(EntryKey);

impl Handle {
    pub fn key<'a, V, S>(&self, table: &'a ChainedTable<V, S>) -> Option<&'a str> {
        table.entries.get(self.0).map(|e| &*e.key)
    }

    pub fn value<'a, V, S>(&self, table: &'a ChainedTable<V, S>) -> Option<&'a V> {
        table.entries.get(self.0).map(|e| &e.value)
    }

    pub fn value_mut<'a, V, S>(&self, table: &'a mut ChainedTable<V, S>) -> Option<&'a mut V> {
        table.entries.get_mut(self.0).map(|e| &mut e.value)
    }
}

#[derive(Debug)]
struct Entry<V> {
    key: Box<str>,
    value: V,
    next: Option<EntryKey>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum TableError {
    #[error("table keys must be non-empty")]
    EmptyKey,
}

pub struct ChainedTable<V, S = Djb2State> {
    hasher: S,
    buckets: Box<[Option<EntryKey>]>, // chain heads
    entries: SlotMap<EntryKey, Entry<V>>,
    cleanup: Option<Cleanup<V>>,
}

impl<V> ChainedTable<V> {
    pub fn new() -> Self {
        Self::with_buckets(0)
    }

    /// A hint of zero selects [`DEFAULT_BUCKETS`].
    pub fn with_buckets(bucket_hint: usize) -> Self {
        Self::with_hasher(bucket_hint, Djb2State)
    }

    /// `cleanup` receives every value the table lets go of: superseded
    /// values on `put`, removed values on `remove`, and whatever remains
    /// when the table is cleared or dropped.
    pub fn with_cleanup<F>(bucket_hint: usize, cleanup: F) -> Self
    where
        F: FnMut(V) + 'static,
    {
        Self::with_buckets(bucket_hint).on_cleanup(cleanup)
    }
}

impl<V> Default for ChainedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> ChainedTable<V, S> {
    pub fn with_hasher(bucket_hint: usize, hasher: S) -> Self {
        let bucket_count = if bucket_hint == 0 {
            DEFAULT_BUCKETS
        } else {
            bucket_hint
        };
        debug!("chained table created with {bucket_count} buckets");
        Self {
            hasher,
            buckets: vec![None; bucket_count].into_boxed_slice(),
            entries: SlotMap::with_key(),
            cleanup: None,
        }
    }

    /// Install (or replace) the cleanup callback.
    pub fn on_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: FnMut(V) + 'static,
    {
        self.cleanup = Some(Box::new(cleanup));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.bucket_count() as f64
    }

    /// Entries of one bucket in chain order; empty for an out-of-range bucket.
    pub fn chain(&self, bucket: usize) -> Chain<'_, V> {
        Chain {
            entries: &self.entries,
            cursor: self.buckets.get(bucket).copied().flatten(),
        }
    }

    /// Bucket index ascending, then chain order within each bucket.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: Chain {
                entries: &self.entries,
                cursor: None,
            },
            remaining: self.entries.len(),
        }
    }

    pub fn for_each<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&'a str, &'a V),
    {
        for (key, value) in self.iter() {
            visit(key, value);
        }
    }

    /// Like `for_each`, but the visitor may end the traversal early.
    pub fn try_for_each<'a, B, F>(&'a self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(&'a str, &'a V) -> ControlFlow<B>,
    {
        for (key, value) in self.iter() {
            visit(key, value)?;
        }
        ControlFlow::Continue(())
    }

    pub fn for_each_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&str, &mut V),
    {
        for head in self.buckets.iter() {
            let mut cursor = *head;
            while let Some(k) = cursor {
                let entry = &mut self.entries[k];
                visit(&*entry.key, &mut entry.value);
                cursor = entry.next;
            }
        }
    }

    /// Remove every entry, passing each value to the cleanup callback.
    pub fn clear(&mut self) {
        self.buckets.fill(None);
        match self.cleanup.as_mut() {
            Some(cleanup) => {
                for (_, entry) in self.entries.drain() {
                    cleanup(entry.value);
                }
            }
            None => self.entries.clear(),
        }
    }

    fn release(&mut self, value: V) {
        if let Some(cleanup) = self.cleanup.as_mut() {
            cleanup(value);
        }
    }
}

impl<V, S> ChainedTable<V, S>
where
    S: BuildHasher,
{
    /// `hash(key) mod bucket_count`.
    pub fn bucket_index(&self, key: &str) -> usize {
        let mut h = self.hasher.build_hasher();
        h.write(key.as_bytes());
        (h.finish() % self.buckets.len() as u64) as usize
    }

    /// Insert `key`, or overwrite its value if already present. A fresh key
    /// is appended to the tail of its chain.
    pub fn put(&mut self, key: &str, value: V) -> Result<Handle, TableError> {
        if key.is_empty() {
            return Err(TableError::EmptyKey);
        }
        let bucket = self.bucket_index(key);
        let mut tail = None;
        let mut cursor = self.buckets[bucket];
        while let Some(k) = cursor {
            let entry = &mut self.entries[k];
            if *entry.key == *key {
                let old = core::mem::replace(&mut entry.value, value);
                self.release(old);
                return Ok(Handle(k));
            }
            tail = Some(k);
            cursor = entry.next;
        }

        let k = self.entries.insert(Entry {
            key: key.into(),
            value,
            next: None,
        });
        match tail {
            Some(t) => self.entries[t].next = Some(k),
            None => self.buckets[bucket] = Some(k),
        }
        Ok(Handle(k))
    }

    pub fn find(&self, key: &str) -> Option<Handle> {
        let mut cursor = self.buckets[self.bucket_index(key)];
        while let Some(k) = cursor {
            let entry = &self.entries[k];
            if *entry.key == *key {
                return Some(Handle(k));
            }
            cursor = entry.next;
        }
        None
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.find(key).map(|h| &self.entries[h.0].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let h = self.find(key)?;
        self.entries.get_mut(h.0).map(|e| &mut e.value)
    }

    /// Unlink `key` and hand its value to the cleanup callback. Returns
    /// false (and changes nothing) if the key is absent.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.unlink(key) {
            Some(entry) => {
                self.release(entry.value);
                true
            }
            None => false,
        }
    }

    /// Unlink `key` and return ownership of the pair; cleanup is not run.
    pub fn take(&mut self, key: &str) -> Option<(String, V)> {
        self.unlink(key).map(|e| (e.key.into_string(), e.value))
    }

    fn unlink(&mut self, key: &str) -> Option<Entry<V>> {
        let bucket = self.bucket_index(key);
        let mut prev: Option<EntryKey> = None;
        let mut cursor = self.buckets[bucket];
        while let Some(k) = cursor {
            let entry = &self.entries[k];
            if *entry.key == *key {
                let next = entry.next;
                match prev {
                    Some(p) => self.entries[p].next = next,
                    None => self.buckets[bucket] = next,
                }
                return self.entries.remove(k);
            }
            prev = Some(k);
            cursor = entry.next;
        }
        None
    }
}

impl<V, S> Drop for ChainedTable<V, S> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<V: fmt::Debug, S> fmt::Debug for ChainedTable<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over one bucket's chain.
pub struct Chain<'a, V> {
    entries: &'a SlotMap<EntryKey, Entry<V>>,
    cursor: Option<EntryKey>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = (&'a str, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cursor?;
        let entries = self.entries;
        let entry = &entries[k];
        self.cursor = entry.next;
        Some((&*entry.key, &entry.value))
    }
}

/// Iterator over every entry of a `ChainedTable`.
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Option<EntryKey>>,
    chain: Chain<'a, V>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.chain.next() {
                self.remaining -= 1;
                return Some(item);
            }
            self.chain.cursor = *self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<'a, V, S> IntoIterator for &'a ChainedTable<V, S> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in bucket 0
    }

    fn recording_table(buckets: usize) -> (ChainedTable<i32>, Rc<RefCell<Vec<i32>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let t = ChainedTable::with_cleanup(buckets, move |v| sink.borrow_mut().push(v));
        (t, log)
    }

    /// Invariant: A zero hint selects the default bucket count; other hints are exact.
    #[test]
    fn bucket_hint_zero_uses_default() {
        let t: ChainedTable<u8> = ChainedTable::with_buckets(0);
        assert_eq!(t.bucket_count(), DEFAULT_BUCKETS);
        let t: ChainedTable<u8> = ChainedTable::with_buckets(7);
        assert_eq!(t.bucket_count(), 7);
        assert!(t.is_empty());
    }

    /// Invariant: `put` then `get` returns the stored value; unknown keys are `None`.
    #[test]
    fn put_then_get() {
        let mut t = ChainedTable::with_buckets(16);
        t.put("alpha", 1).unwrap();
        t.put("beta", 2).unwrap();
        assert_eq!(t.get("alpha"), Some(&1));
        assert_eq!(t.get("beta"), Some(&2));
        assert_eq!(t.get("gamma"), None);
        assert_eq!(t.len(), 2);
    }

    /// Invariant: Keys compare case-sensitively.
    #[test]
    fn keys_are_case_sensitive() {
        let mut t = ChainedTable::with_buckets(16);
        t.put("binky", 1).unwrap();
        t.put("BinKy", 2).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("binky"), Some(&1));
        assert_eq!(t.get("BinKy"), Some(&2));
    }

    /// Invariant: Empty keys are rejected and leave the table unchanged.
    #[test]
    fn empty_key_rejected() {
        let mut t = ChainedTable::with_buckets(4);
        assert_eq!(t.put("", 1), Err(TableError::EmptyKey));
        assert!(t.is_empty());
        assert_eq!(t.get(""), None);
    }

    /// Invariant: Overwriting keeps the count, runs cleanup once on the old value,
    /// and keeps the same handle.
    #[test]
    fn overwrite_cleans_superseded_value() {
        let (mut t, log) = recording_table(8);
        let h1 = t.put("k", 10).unwrap();
        let h2 = t.put("k", 20).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("k"), Some(&20));
        assert_eq!(*log.borrow(), vec![10]);
    }

    /// Invariant: `remove` unlinks the entry, cleans its value and decrements the count;
    /// removing an absent key is a no-op.
    #[test]
    fn remove_present_and_absent() {
        let (mut t, log) = recording_table(8);
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        assert!(t.remove("a"));
        assert_eq!(t.get("a"), None);
        assert_eq!(t.len(), 1);
        assert!(!t.remove("a"));
        assert!(!t.remove("zzz"));
        assert_eq!(t.len(), 1);
        assert_eq!(*log.borrow(), vec![1]);
    }

    /// Invariant: `take` returns the owned pair without invoking cleanup.
    #[test]
    fn take_bypasses_cleanup() {
        let (mut t, log) = recording_table(8);
        t.put("k", 5).unwrap();
        assert_eq!(t.take("k"), Some(("k".to_string(), 5)));
        assert_eq!(t.take("k"), None);
        assert!(t.is_empty());
        assert!(log.borrow().is_empty());
    }

    /// Invariant: Dropping the table cleans every remaining value exactly once.
    #[test]
    fn drop_cleans_remaining_values() {
        let (mut t, log) = recording_table(3);
        for (i, k) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            t.put(k, i as i32).unwrap();
        }
        t.remove("c");
        drop(t);
        let mut seen = log.borrow().clone();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    /// Invariant: New keys append to the tail of their chain, so chain order is
    /// insertion order when every key collides.
    #[test]
    fn chain_preserves_insertion_order() {
        let mut t: ChainedTable<i32, ConstBuildHasher> =
            ChainedTable::with_hasher(4, ConstBuildHasher);
        for (i, k) in ["x", "y", "z"].iter().enumerate() {
            t.put(k, i as i32).unwrap();
        }
        let keys: Vec<&str> = t.chain(0).map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
        assert_eq!(t.chain(1).count(), 0);
        assert_eq!(t.chain(99).count(), 0);
    }

    /// Invariant: Removing the head, a middle entry, and the tail of a chain relinks
    /// the survivors in order.
    #[test]
    fn unlink_head_middle_tail() {
        let mut t: ChainedTable<i32, ConstBuildHasher> =
            ChainedTable::with_hasher(1, ConstBuildHasher);
        for (i, k) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            t.put(k, i as i32).unwrap();
        }
        assert!(t.remove("a")); // head
        assert!(t.remove("c")); // middle
        assert!(t.remove("e")); // tail
        let keys: Vec<&str> = t.chain(0).map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "d"]);
        t.put("f", 5).unwrap();
        let keys: Vec<&str> = t.chain(0).map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "d", "f"]);
        assert_eq!(t.len(), 3);
    }

    /// Invariant: Traversal visits every entry once, in bucket order then chain order.
    #[test]
    fn traversal_order_and_completeness() {
        let mut t = ChainedTable::with_buckets(5);
        let keys = ["one", "two", "three", "four", "five", "six", "seven"];
        for (i, k) in keys.iter().enumerate() {
            t.put(k, i).unwrap();
        }
        let mut visited = Vec::new();
        t.for_each(|k, _| visited.push(k.to_string()));
        assert_eq!(visited.len(), t.len());

        let expected: Vec<String> = (0..t.bucket_count())
            .flat_map(|b| t.chain(b).map(|(k, _)| k.to_string()).collect::<Vec<_>>())
            .collect();
        assert_eq!(visited, expected);

        let unique: BTreeSet<String> = visited.into_iter().collect();
        let wanted: BTreeSet<String> = keys.iter().map(|s| s.to_string()).collect();
        assert_eq!(unique, wanted);
        assert_eq!(t.iter().len(), keys.len());
    }

    /// Invariant: `try_for_each` stops as soon as the visitor breaks.
    #[test]
    fn try_for_each_breaks_early() {
        let mut t = ChainedTable::with_buckets(3);
        for k in ["a", "b", "c", "d"] {
            t.put(k, 0).unwrap();
        }
        let mut seen = 0;
        let flow = t.try_for_each(|k, _| {
            seen += 1;
            if seen == 2 {
                ControlFlow::Break(k.to_string())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, 2);
        assert!(matches!(flow, ControlFlow::Break(_)));
    }

    /// Invariant: `for_each_mut` updates are visible to later lookups.
    #[test]
    fn for_each_mut_updates_values() {
        let mut t = ChainedTable::with_buckets(2);
        for (i, k) in ["k1", "k2", "k3"].iter().enumerate() {
            t.put(k, i as i32).unwrap();
        }
        t.for_each_mut(|_, v| *v += 10);
        assert_eq!(t.get("k1"), Some(&10));
        assert_eq!(t.get("k2"), Some(&11));
        assert_eq!(t.get("k3"), Some(&12));
        *t.get_mut("k1").unwrap() = 99;
        assert_eq!(t.get("k1"), Some(&99));
    }

    /// Invariant: A removed entry's handle goes stale and never aliases a later entry.
    #[test]
    fn stale_handle_does_not_alias_new_entry() {
        let mut t = ChainedTable::with_buckets(4);
        let h1 = t.put("old", 1).unwrap();
        assert_eq!(h1.key(&t), Some("old"));
        assert!(t.remove("old"));
        let h2 = t.put("new", 2).unwrap();
        assert_ne!(h1, h2);
        assert!(h1.value(&t).is_none());
        assert_eq!(h2.value(&t), Some(&2));
        *h2.value_mut(&mut t).unwrap() = 3;
        assert_eq!(t.get("new"), Some(&3));
        assert_eq!(t.find("new"), Some(h2));
    }

    /// Invariant: Lookups resolve correctly when every key shares one chain.
    #[test]
    fn collision_handling_with_const_hasher() {
        let mut t: ChainedTable<i32, ConstBuildHasher> =
            ChainedTable::with_hasher(8, ConstBuildHasher);
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        t.put("a", 3).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("a"), Some(&3));
        assert_eq!(t.get("b"), Some(&2));
        assert_eq!(t.bucket_index("a"), t.bucket_index("b"));
    }

    /// Invariant: The bucket count never changes regardless of load.
    #[test]
    fn no_resize_under_load() {
        let mut t = ChainedTable::with_buckets(2);
        for i in 0..100 {
            t.put(&format!("k{i}"), i).unwrap();
        }
        assert_eq!(t.bucket_count(), 2);
        assert_eq!(t.len(), 100);
        assert!((t.load_factor() - 50.0).abs() < f64::EPSILON);
        assert_eq!(t.chain(0).count() + t.chain(1).count(), 100);
    }

    /// Invariant: `clear` empties every chain, cleans values, and the table stays usable.
    #[test]
    fn clear_then_reuse() {
        let (mut t, log) = recording_table(4);
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.iter().count(), 0);
        assert_eq!(log.borrow().len(), 2);
        t.put("a", 3).unwrap();
        assert_eq!(t.get("a"), Some(&3));
    }
}
