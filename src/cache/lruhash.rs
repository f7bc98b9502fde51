// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! A concurrent hash table with least-recently-used eviction.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::thread;

use log::{error, trace};
use parking_lot::lock_api::{ArcMutexGuard, ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{Mutex, RawMutex, RawRwLock, RwLock};
use slab::Slab;

////////////////////////////////////////////////////////////////////////
// ENTRY POLICIES                                                     //
////////////////////////////////////////////////////////////////////////

/// Describes the entries stored in an [`LruHash`]: how big they are,
/// when two keys are the same, and what to do with keys and data the
/// table lets go of.
///
/// The delete hooks are called exactly once for every key and every
/// piece of data the table retires, whether through eviction,
/// replacement, [`LruHash::remove`], [`LruHash::clear`], or dropping
/// the table. They never run while the table holds any of its locks.
pub trait EntryPolicy {
    type Key;
    type Data;

    /// Returns the memory charged against the table's budget for an
    /// entry.
    fn size(&self, key: &Self::Key, data: &Self::Data) -> usize;

    /// Returns whether two keys identify the same entry.
    fn key_eq(&self, a: &Self::Key, b: &Self::Key) -> bool;

    fn delete_key(&self, _key: Self::Key) {}

    fn delete_data(&self, _data: Self::Data) {}
}

////////////////////////////////////////////////////////////////////////
// THE TABLE                                                          //
////////////////////////////////////////////////////////////////////////

/// A concurrent, memory-bounded hash table with LRU eviction.
///
/// Entries are located by a caller-supplied 32-bit hash and a key. The
/// table has three layers of locks, always taken in this order:
///
/// 1. the table lock, which guards the LRU list, the entry storage and
///    the accounting;
/// 2. one lock per bin, which guards the bin's chain and is held while
///    a lookup locks the entry it found, so the entry cannot be evicted
///    in between; and
/// 3. a reader/writer lock per entry, which guards the entry's data and
///    is held by the [`ReadGuard`] or [`WriteGuard`] a lookup returns.
///
/// Keys are immutable once inserted and are compared without taking
/// the entry lock.
///
/// A thread must not call into the table while it holds a guard: an
/// insertion or eviction may need to write-lock that very entry.
pub struct LruHash<P: EntryPolicy> {
    policy: P,
    table: Mutex<Table<P::Key, P::Data>>,
}

type Bin = Arc<Mutex<Option<usize>>>;

struct Table<K, D> {
    /// The head of each bin's chain, as an index into `nodes`.
    bins: Box<[Bin]>,
    mask: usize,
    nodes: Slab<Node<K, D>>,
    lru_first: Option<usize>,
    lru_last: Option<usize>,
    space_used: usize,
    space_max: usize,
}

struct Node<K, D> {
    hash: u32,
    key: Arc<K>,
    data: Arc<RwLock<D>>,
    size: usize,
    bin_next: Option<usize>,
    lru_prev: Option<usize>,
    lru_next: Option<usize>,
}

/// Things the table has let go of, to be handed to the delete hooks
/// once its locks are released.
enum Retired<K, D> {
    /// A whole entry. Its data is write-locked until just before
    /// deletion, so no borrower can still be using it.
    Entry {
        key: Arc<K>,
        data: Arc<RwLock<D>>,
        lock: ArcRwLockWriteGuard<RawRwLock, D>,
    },
    Key(K),
    Data(D),
}

impl<P: EntryPolicy> LruHash<P> {
    /// Creates a table with `bins` bins (a non-zero power of two) that
    /// evicts entries once more than `space_max` bytes are in use.
    pub fn new(bins: usize, space_max: usize, policy: P) -> Result<Self, Error> {
        if !bins.is_power_of_two() {
            return Err(Error::BinCountNotPowerOfTwo(bins));
        }
        let mask = bins - 1;
        let bins = (0..bins).map(|_| Arc::new(Mutex::new(None))).collect();
        Ok(Self {
            policy,
            table: Mutex::new(Table {
                bins,
                mask,
                nodes: Slab::new(),
                lru_first: None,
                lru_last: None,
                space_used: 0,
                space_max,
            }),
        })
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Inserts `data` under `key`. If an entry with an equal key is
    /// already present, its data is replaced and its key is kept; the
    /// new key and the old data go to the delete hooks. Either way the
    /// entry becomes the most recently used.
    ///
    /// Afterwards, entries are evicted from the LRU end while the table
    /// is over its memory budget, and the table doubles its bin count
    /// once it holds as many entries as it has bins.
    pub fn insert(&self, hash: u32, key: P::Key, data: P::Data) {
        let size = self.policy.size(&key, &data);
        let mut retired = Vec::new();

        let mut table = self.table.lock();
        let bin = table.bin(hash).clone();
        let mut head = bin.lock();
        match table.find(&self.policy, *head, hash, &key) {
            Some(index) => {
                let node = &mut table.nodes[index];
                let old_data = std::mem::replace(&mut *node.data.write(), data);
                let old_size = std::mem::replace(&mut node.size, size);
                table.space_used = table.space_used - old_size + size;
                table.lru_touch(index);
                retired.push(Retired::Key(key));
                retired.push(Retired::Data(old_data));
            }
            None => {
                let index = table.nodes.insert(Node {
                    hash,
                    key: Arc::new(key),
                    data: Arc::new(RwLock::new(data)),
                    size,
                    bin_next: *head,
                    lru_prev: None,
                    lru_next: None,
                });
                *head = Some(index);
                table.lru_push_front(index);
                table.space_used += size;
            }
        }
        drop(head);

        if table.space_used > table.space_max {
            table.reclaim_space(&mut retired);
        }
        if table.nodes.len() >= table.bins.len() {
            table.grow();
        }
        drop(table);

        self.delete_all(retired);
    }

    /// Looks up the entry for `key` and read-locks its data. The entry
    /// becomes the most recently used.
    pub fn lookup_read(&self, hash: u32, key: &P::Key) -> Option<ReadGuard<P>> {
        let (bin_guard, key, data) = self.lookup(hash, key)?;
        let data = data.read_arc();
        drop(bin_guard);
        Some(ReadGuard {
            key,
            data,
            _table: PhantomData,
        })
    }

    /// Like [`LruHash::lookup_read`], but write-locks the data.
    pub fn lookup_write(&self, hash: u32, key: &P::Key) -> Option<WriteGuard<P>> {
        let (bin_guard, key, data) = self.lookup(hash, key)?;
        let data = data.write_arc();
        drop(bin_guard);
        Some(WriteGuard {
            key,
            data,
            _table: PhantomData,
        })
    }

    /// Finds an entry and promotes it in the LRU list. The returned bin
    /// guard must be held until the entry's lock is taken.
    #[allow(clippy::type_complexity)]
    fn lookup(
        &self,
        hash: u32,
        key: &P::Key,
    ) -> Option<(
        ArcMutexGuard<RawMutex, Option<usize>>,
        Arc<P::Key>,
        Arc<RwLock<P::Data>>,
    )> {
        let mut table = self.table.lock();
        let bin_guard = table.bin(hash).lock_arc();
        let index = table.find(&self.policy, *bin_guard, hash, key)?;
        table.lru_touch(index);
        let node = &table.nodes[index];
        Some((bin_guard, node.key.clone(), node.data.clone()))
    }

    /// Removes the entry for `key`, if there is one. Returns whether an
    /// entry was removed.
    pub fn remove(&self, hash: u32, key: &P::Key) -> bool {
        let mut table = self.table.lock();
        let bin = table.bin(hash).clone();
        let mut head = bin.lock();
        let index = match table.find(&self.policy, *head, hash, key) {
            Some(index) => index,
            None => return false,
        };
        table.bin_unlink(&mut head, index);
        drop(head);
        let retired = table.retire(index);
        drop(table);

        self.delete_all(vec![retired]);
        true
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut table = self.table.lock();
        for bin in table.bins.iter() {
            *bin.lock() = None;
        }
        let mut retired = Vec::with_capacity(table.nodes.len());
        while let Some(index) = table.lru_first {
            retired.push(table.retire(index));
        }
        debug_assert!(table.nodes.is_empty());
        drop(table);

        self.delete_all(retired);
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.table.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the memory charged to the entries, in bytes.
    pub fn space_used(&self) -> usize {
        self.table.lock().space_used
    }

    pub fn space_max(&self) -> usize {
        self.table.lock().space_max
    }

    pub fn bin_count(&self) -> usize {
        self.table.lock().bins.len()
    }

    fn delete_all(&self, retired: Vec<Retired<P::Key, P::Data>>) {
        for item in retired {
            match item {
                Retired::Entry { key, data, lock } => {
                    drop(lock);
                    self.policy.delete_key(into_inner(key));
                    self.policy.delete_data(into_inner(data).into_inner());
                }
                Retired::Key(key) => self.policy.delete_key(key),
                Retired::Data(data) => self.policy.delete_data(data),
            }
        }
    }
}

impl<P: EntryPolicy> Drop for LruHash<P> {
    fn drop(&mut self) {
        let table = self.table.get_mut();
        for node in table.nodes.drain() {
            self.policy.delete_key(into_inner(node.key));
            self.policy.delete_data(into_inner(node.data).into_inner());
        }
    }
}

impl<P: EntryPolicy> fmt::Debug for LruHash<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let table = self.table.lock();
        f.debug_struct("LruHash")
            .field("len", &table.nodes.len())
            .field("bins", &table.bins.len())
            .field("space_used", &table.space_used)
            .field("space_max", &table.space_max)
            .finish()
    }
}

/// Takes the value out of an [`Arc`] the table has unlinked. Nobody can
/// obtain a new reference to it, but a borrower that has just released
/// its lock may not have dropped its reference yet.
fn into_inner<T>(mut arc: Arc<T>) -> T {
    loop {
        match Arc::try_unwrap(arc) {
            Ok(value) => return value,
            Err(shared) => {
                arc = shared;
                thread::yield_now();
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TABLE INTERNALS                                                    //
////////////////////////////////////////////////////////////////////////

impl<K, D> Table<K, D> {
    fn bin(&self, hash: u32) -> &Bin {
        &self.bins[hash as usize & self.mask]
    }

    /// Walks a bin's chain, starting from `head`, for an entry matching
    /// `hash` and `key`.
    fn find<P>(&self, policy: &P, head: Option<usize>, hash: u32, key: &K) -> Option<usize>
    where
        P: EntryPolicy<Key = K, Data = D>,
    {
        let mut next = head;
        while let Some(index) = next {
            let node = &self.nodes[index];
            if node.hash == hash && policy.key_eq(&node.key, key) {
                return Some(index);
            }
            next = node.bin_next;
        }
        None
    }

    /// Unlinks an entry from the chain whose head is `head`.
    fn bin_unlink(&mut self, head: &mut Option<usize>, index: usize) {
        let after = self.nodes[index].bin_next.take();
        if *head == Some(index) {
            *head = after;
            return;
        }
        let mut next = *head;
        while let Some(current) = next {
            if self.nodes[current].bin_next == Some(index) {
                self.nodes[current].bin_next = after;
                return;
            }
            next = self.nodes[current].bin_next;
        }
    }

    fn lru_push_front(&mut self, index: usize) {
        let old_first = self.lru_first.replace(index);
        let node = &mut self.nodes[index];
        node.lru_prev = None;
        node.lru_next = old_first;
        match old_first {
            Some(first) => self.nodes[first].lru_prev = Some(index),
            None => self.lru_last = Some(index),
        }
    }

    fn lru_unlink(&mut self, index: usize) {
        let node = &mut self.nodes[index];
        let (prev, next) = (node.lru_prev.take(), node.lru_next.take());
        match prev {
            Some(prev) => self.nodes[prev].lru_next = next,
            None => self.lru_first = next,
        }
        match next {
            Some(next) => self.nodes[next].lru_prev = prev,
            None => self.lru_last = prev,
        }
    }

    /// Makes an entry the most recently used.
    fn lru_touch(&mut self, index: usize) {
        if self.lru_first != Some(index) {
            self.lru_unlink(index);
            self.lru_push_front(index);
        }
    }

    /// Removes an entry that is already out of its bin from the LRU
    /// list and the storage, and write-locks its data.
    fn retire(&mut self, index: usize) -> Retired<K, D> {
        self.lru_unlink(index);
        let node = self.nodes.remove(index);
        self.space_used -= node.size;
        let lock = node.data.write_arc();
        Retired::Entry {
            key: node.key,
            data: node.data,
            lock,
        }
    }

    /// Evicts entries from the LRU end until the table is within its
    /// budget. The most recently used entry is never evicted.
    fn reclaim_space(&mut self, retired: &mut Vec<Retired<K, D>>) {
        while self.nodes.len() > 1 && self.space_used > self.space_max {
            let index = match self.lru_last {
                Some(index) => index,
                None => break,
            };
            let bin = self.bin(self.nodes[index].hash).clone();
            let mut head = bin.lock();
            self.bin_unlink(&mut head, index);
            drop(head);
            trace!(
                "evicting cache entry (hash {:#010x}, {} bytes)",
                self.nodes[index].hash,
                self.nodes[index].size
            );
            retired.push(self.retire(index));
        }
    }

    /// Doubles the number of bins. Each old bin's chain splits between
    /// two new bins. If the new bins cannot be allocated, the table
    /// stays as it is.
    fn grow(&mut self) {
        let new_len = self.bins.len() * 2;
        let mut heads: Vec<Option<usize>> = Vec::new();
        let mut bins: Vec<Bin> = Vec::new();
        if heads.try_reserve_exact(new_len).is_err() || bins.try_reserve_exact(new_len).is_err()
        {
            error!(
                "failed to grow cache table to {} bins; continuing with {}",
                new_len,
                self.bins.len()
            );
            return;
        }
        heads.resize(new_len, None);
        let new_mask = new_len - 1;

        for old in self.bins.iter() {
            let mut head = old.lock();
            let mut next = head.take();
            while let Some(index) = next {
                let node = &mut self.nodes[index];
                next = node.bin_next;
                let slot = &mut heads[node.hash as usize & new_mask];
                node.bin_next = slot.replace(index);
            }
        }

        bins.extend(heads.into_iter().map(|head| Arc::new(Mutex::new(head))));
        self.bins = bins.into_boxed_slice();
        self.mask = new_mask;
    }
}

////////////////////////////////////////////////////////////////////////
// GUARDS                                                             //
////////////////////////////////////////////////////////////////////////

/// A read lock on an entry, returned by [`LruHash::lookup_read`]. It
/// dereferences to the entry's data.
pub struct ReadGuard<'a, P: EntryPolicy> {
    key: Arc<P::Key>,
    data: ArcRwLockReadGuard<RawRwLock, P::Data>,
    _table: PhantomData<&'a LruHash<P>>,
}

impl<P: EntryPolicy> ReadGuard<'_, P> {
    pub fn key(&self) -> &P::Key {
        &self.key
    }
}

impl<P: EntryPolicy> Deref for ReadGuard<'_, P> {
    type Target = P::Data;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// A write lock on an entry, returned by [`LruHash::lookup_write`].
/// Changes to the data do not change the memory charged for the entry.
pub struct WriteGuard<'a, P: EntryPolicy> {
    key: Arc<P::Key>,
    data: ArcRwLockWriteGuard<RawRwLock, P::Data>,
    _table: PhantomData<&'a LruHash<P>>,
}

impl<P: EntryPolicy> WriteGuard<'_, P> {
    pub fn key(&self) -> &P::Key {
        &self.key
    }
}

impl<P: EntryPolicy> Deref for WriteGuard<'_, P> {
    type Target = P::Data;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<P: EntryPolicy> DerefMut for WriteGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling invalid [`LruHash`] parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    BinCountNotPowerOfTwo(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BinCountNotPowerOfTwo(n) => {
                write!(f, "bin count {} is not a non-zero power of two", n)
            }
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// Keys are an ID and a tag; only the ID takes part in comparisons.
    /// Data is the size charged for the entry.
    #[derive(Default)]
    struct Recorder {
        deleted_keys: Mutex<Vec<(u32, &'static str)>>,
        deleted_data: Mutex<Vec<usize>>,
    }

    impl EntryPolicy for Recorder {
        type Key = (u32, &'static str);
        type Data = usize;

        fn size(&self, _key: &Self::Key, data: &Self::Data) -> usize {
            *data
        }

        fn key_eq(&self, a: &Self::Key, b: &Self::Key) -> bool {
            a.0 == b.0
        }

        fn delete_key(&self, key: Self::Key) {
            self.deleted_keys.lock().push(key);
        }

        fn delete_data(&self, data: Self::Data) {
            self.deleted_data.lock().push(data);
        }
    }

    fn table(bins: usize, space_max: usize) -> LruHash<Recorder> {
        LruHash::new(bins, space_max, Recorder::default()).unwrap()
    }

    fn get(table: &LruHash<Recorder>, id: u32) -> Option<usize> {
        table.lookup_read(hash(id), &(id, "")).map(|guard| *guard)
    }

    // Collisions are frequent on purpose.
    fn hash(id: u32) -> u32 {
        id % 3
    }

    fn deleted_ids(table: &LruHash<Recorder>) -> Vec<u32> {
        let mut ids: Vec<u32> = table.policy().deleted_keys.lock().iter().map(|k| k.0).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn bin_count_must_be_power_of_two() {
        for bad in [0, 3, 1000] {
            assert_eq!(
                LruHash::new(bad, 100, Recorder::default()).err(),
                Some(Error::BinCountNotPowerOfTwo(bad))
            );
        }
        assert!(LruHash::new(1, 100, Recorder::default()).is_ok());
    }

    #[test]
    fn insert_and_lookup_work() {
        let table = table(64, 1000);
        table.insert(hash(1), (1, "a"), 10);
        table.insert(hash(4), (4, "b"), 20);
        assert_eq!(get(&table, 1), Some(10));
        assert_eq!(get(&table, 4), Some(20));
        assert_eq!(get(&table, 7), None);
        assert_eq!(table.len(), 2);
        assert_eq!(table.space_used(), 30);
        assert!(deleted_ids(&table).is_empty());
    }

    #[test]
    fn replacement_keeps_existing_key() {
        let table = table(64, 1000);
        table.insert(hash(1), (1, "original"), 10);
        table.insert(hash(1), (1, "redundant"), 25);

        let guard = table.lookup_read(hash(1), &(1, "")).unwrap();
        assert_eq!(guard.key().1, "original");
        assert_eq!(*guard, 25);
        drop(guard);

        assert_eq!(table.len(), 1);
        assert_eq!(table.space_used(), 25);
        assert_eq!(*table.policy().deleted_keys.lock(), [(1, "redundant")]);
        assert_eq!(*table.policy().deleted_data.lock(), [10]);
    }

    #[test]
    fn eviction_follows_recency() {
        let table = table(64, 30);
        for id in 1..=3 {
            table.insert(hash(id), (id, ""), 10);
        }
        assert_eq!(get(&table, 1), Some(10));

        // Over budget: 2 is now the least recently used.
        table.insert(hash(4), (4, ""), 10);
        assert_eq!(deleted_ids(&table), [2]);
        assert_eq!(get(&table, 2), None);

        // 3 is next, then 1.
        table.insert(hash(5), (5, ""), 20);
        assert_eq!(deleted_ids(&table), [1, 2, 3]);
        assert_eq!(get(&table, 4), Some(10));
        assert_eq!(get(&table, 5), Some(20));
        assert_eq!(table.space_used(), 30);
    }

    #[test]
    fn last_entry_is_never_evicted() {
        let table = table(64, 5);
        table.insert(hash(1), (1, ""), 100);
        assert_eq!(get(&table, 1), Some(100));
        assert_eq!(table.len(), 1);

        table.insert(hash(2), (2, ""), 1);
        assert_eq!(deleted_ids(&table), [1]);
        assert_eq!(get(&table, 2), Some(1));
    }

    #[test]
    fn growth_keeps_entries_findable() {
        let table = table(2, usize::MAX);
        for id in 0u32..40 {
            table.insert(id.wrapping_mul(0x9e37_79b9), (id, ""), 1);
        }
        assert_eq!(table.bin_count(), 64);
        for id in 0u32..40 {
            assert!(table.lookup_read(id.wrapping_mul(0x9e37_79b9), &(id, "")).is_some());
        }
        assert!(deleted_ids(&table).is_empty());
    }

    #[test]
    fn remove_works() {
        let table = table(64, 1000);
        table.insert(hash(1), (1, ""), 10);
        table.insert(hash(4), (4, ""), 20);
        assert!(table.remove(hash(1), &(1, "")));
        assert!(!table.remove(hash(1), &(1, "")));
        assert_eq!(get(&table, 1), None);
        assert_eq!(get(&table, 4), Some(20));
        assert_eq!(table.space_used(), 20);
        assert_eq!(deleted_ids(&table), [1]);
    }

    #[test]
    fn clear_and_drop_delete_everything() {
        let table = table(64, 1000);
        for id in 0..5 {
            table.insert(hash(id), (id, ""), 1);
        }
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.space_used(), 0);
        assert_eq!(deleted_ids(&table), [0, 1, 2, 3, 4]);

        let recorder = Arc::new(Recorder::default());
        struct Shared(Arc<Recorder>);
        impl EntryPolicy for Shared {
            type Key = u32;
            type Data = usize;
            fn size(&self, _: &u32, data: &usize) -> usize {
                *data
            }
            fn key_eq(&self, a: &u32, b: &u32) -> bool {
                a == b
            }
            fn delete_key(&self, key: u32) {
                self.0.deleted_keys.lock().push((key, ""));
            }
        }
        let table = LruHash::new(8, 1000, Shared(recorder.clone())).unwrap();
        table.insert(7, 7, 1);
        table.insert(8, 8, 1);
        drop(table);
        assert_eq!(recorder.deleted_keys.lock().len(), 2);
    }

    #[test]
    fn write_guard_modifies_data() {
        let table = table(64, 1000);
        table.insert(hash(1), (1, ""), 10);
        *table.lookup_write(hash(1), &(1, "")).unwrap() += 1;
        assert_eq!(get(&table, 1), Some(11));
    }

    #[test]
    fn concurrent_use_is_consistent() {
        let table = Arc::new(table(4, 500));
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let table = table.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        let id = (i * 7 + t) % 200;
                        table.insert(id, (id, ""), 3);
                        if let Some(guard) = table.lookup_read(id / 2, &(id / 2, "")) {
                            assert_eq!(*guard, 3);
                        }
                        if i % 50 == 0 {
                            table.remove(id, &(id, ""));
                        }
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert!(table.space_used() <= 500);
        assert_eq!(table.space_used(), table.len() * 3);
        let recorder = table.policy();
        assert_eq!(
            recorder.deleted_keys.lock().len(),
            recorder.deleted_data.lock().len()
        );
    }
}
