//! `IdRemapTable`: a lock-free, direct-addressed global/local ID bijection.
//!
//! The table owns two arrays of `capacity` slots:
//! - `o2n`, indexed by global ID: claim flag plus assigned local ID
//! - `n2o`, indexed by local ID: owning global ID
//!
//! and one counter, `num_items`, which is both the number of claimed keys and
//! the next local ID to hand out. Keys are claimed with a single CAS on the
//! slot's `id` field; the winner takes a local ID with fetch-add. Losers do
//! nothing, which deduplicates repeated IDs within and across `populate` calls.
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `populate` | \(O(n / p)\) | One CAS per entry, one fetch-add per new key |
//! | `map_nodes` | \(O(n / p)\) | Sequential read of `n2o` |
//! | `map_edges` | \(O(m / p)\) | Two random reads of `o2n` per edge |
//! | `reset` | \(O(capacity / p)\) | Touches every slot, however sparse the batch |

use core::sync::atomic::Ordering;

use crossbeam_utils::CachePadded;
use rayon::prelude::*;

use super::bucket::{N2oBucket, O2nBucket};
use crate::alloc::{AllocError, DeviceBuffer, MemoryService, SYSTEM_MEMORY};
use crate::concurrency::{AtomicId, WorkerPool};
use crate::device::Context;
use crate::{IdType, EMPTY_KEY};

/// Concurrent global-to-local ID remapping table with fixed capacity.
///
/// Capacity must exceed the largest global ID that will ever be inserted; the
/// table is addressed by key value and never grows.
///
/// `insert`/`populate` take `&self` and may race freely with each other. The
/// point reads `lookup` and `global_of` may also run during a `populate`: a
/// claim whose local ID is not yet published reads as `None`. The bulk reads
/// `map_nodes`, `unique_nodes` and `map_edges` must not overlap a `populate`;
/// run them after it returns. `reset` takes `&mut self`, so it cannot overlap
/// any other operation.
pub struct IdRemapTable<'m> {
    o2n: DeviceBuffer<'m, O2nBucket>,
    n2o: DeviceBuffer<'m, N2oBucket>,
    num_items: CachePadded<AtomicId>,
    capacity: usize,
}

impl IdRemapTable<'static> {
    /// Creates a table in host memory from the process-wide system allocator.
    ///
    /// # Panics
    /// Panics if `capacity > EMPTY_KEY` or if allocation fails.
    pub fn new(capacity: usize) -> Self {
        match Self::with_memory(capacity, Context::Cpu, &SYSTEM_MEMORY) {
            Ok(table) => table,
            Err(err) => panic!("failed to allocate remap table: {err}"),
        }
    }
}

impl<'m> IdRemapTable<'m> {
    /// Creates a table whose arrays are allocated on `context` by `memory`.
    ///
    /// Every slot starts unclaimed with both IDs at [`EMPTY_KEY`], which is
    /// exactly the state `reset` leaves behind.
    ///
    /// # Errors
    /// Propagates the memory service's `AllocError`.
    ///
    /// # Panics
    /// Panics if `capacity > EMPTY_KEY`: the sentinel must stay outside the key domain.
    pub fn with_memory(
        capacity: usize,
        context: Context,
        memory: &'m dyn MemoryService,
    ) -> Result<Self, AllocError> {
        assert!(
            capacity <= EMPTY_KEY as usize,
            "capacity {capacity} exceeds the ID domain (max {EMPTY_KEY})"
        );

        let o2n = DeviceBuffer::from_fn(memory, context, capacity, |_| O2nBucket::empty())?;
        let n2o = DeviceBuffer::from_fn(memory, context, capacity, |_| N2oBucket::empty())?;

        tracing::debug!(capacity, %context, "remap table allocated");
        Ok(Self {
            o2n,
            n2o,
            num_items: CachePadded::new(AtomicId::new(0)),
            capacity,
        })
    }

    /// Number of slots, i.e. one past the largest admissible global ID.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of distinct global IDs claimed since construction or the last reset.
    #[inline]
    pub fn num_items(&self) -> usize {
        self.num_items.load(Ordering::Acquire) as usize
    }

    /// Returns `true` if nothing has been claimed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_items() == 0
    }

    /// Context the table's arrays live on.
    #[inline]
    pub fn context(&self) -> Context {
        self.o2n.context()
    }

    #[inline]
    fn bucket(&self, id: IdType) -> &O2nBucket {
        assert!(
            (id as usize) < self.capacity,
            "global id {id} out of range for capacity {}",
            self.capacity
        );
        &self.o2n[id as usize]
    }

    /// Claims `id`, assigning it the next local ID if it was unclaimed.
    ///
    /// Returns `true` iff this call performed the claim. Safe to race with any
    /// number of other `insert`/`populate` calls.
    ///
    /// # Panics
    /// Panics if `id >= capacity`.
    #[inline]
    pub fn insert(&self, id: IdType) -> bool {
        let bucket = self.bucket(id);
        if bucket.id.compare_exchange_cas(EMPTY_KEY, id).is_err() {
            return false;
        }
        let local = self.num_items.fetch_add(1, Ordering::AcqRel);
        bucket.local.store(local, Ordering::Release);
        self.n2o[local as usize].global.store(id, Ordering::Release);
        true
    }

    /// Claims every ID of `input` in parallel on `pool`.
    ///
    /// Duplicates, within `input` or against earlier calls, are absorbed
    /// silently. The order in which local IDs are handed out is unspecified.
    ///
    /// # Panics
    /// Panics if any entry is `>= capacity`.
    pub fn populate(&self, pool: &WorkerPool, input: &[IdType]) {
        let before = self.num_items();
        pool.for_each_index(input.len(), |i| {
            self.insert(input[i]);
        });
        tracing::trace!(
            input = input.len(),
            claimed = self.num_items() - before,
            num_items = self.num_items(),
            "populate"
        );
    }

    /// Writes the global ID of local IDs `0..output.len()` into `output`.
    ///
    /// The result is the dense list of unique global IDs in local-ID order.
    ///
    /// # Panics
    /// Panics if `output.len() > num_items()`.
    pub fn map_nodes(&self, pool: &WorkerPool, output: &mut [IdType]) {
        let num_items = self.num_items();
        assert!(
            output.len() <= num_items,
            "requested {} nodes but only {num_items} are mapped",
            output.len()
        );
        let n2o = &*self.n2o;
        pool.for_each_mut(output, |i, slot| {
            *slot = n2o[i].global.load(Ordering::Acquire);
        });
    }

    /// Returns every claimed global ID in local-ID order.
    pub fn unique_nodes(&self, pool: &WorkerPool) -> Vec<IdType> {
        let mut out = vec![EMPTY_KEY; self.num_items()];
        self.map_nodes(pool, &mut out);
        out
    }

    /// Translates an edge list from global to local IDs.
    ///
    /// Every endpoint must have been claimed by an earlier, completed
    /// `populate`. In debug builds an unclaimed endpoint panics; in release
    /// builds it yields [`EMPTY_KEY`].
    ///
    /// # Panics
    /// Panics if the four slices differ in length or an endpoint is `>= capacity`.
    pub fn map_edges(
        &self,
        pool: &WorkerPool,
        src: &[IdType],
        dst: &[IdType],
        new_src: &mut [IdType],
        new_dst: &mut [IdType],
    ) {
        let len = src.len();
        assert!(
            dst.len() == len && new_src.len() == len && new_dst.len() == len,
            "edge arrays differ in length: src={len} dst={} new_src={} new_dst={}",
            dst.len(),
            new_src.len(),
            new_dst.len()
        );

        let min = pool.min_chunk();
        pool.install(|| {
            new_src
                .par_iter_mut()
                .zip(new_dst.par_iter_mut())
                .with_min_len(min)
                .enumerate()
                .for_each(|(i, (out_src, out_dst))| {
                    *out_src = self.local_unchecked_liveness(src[i]);
                    *out_dst = self.local_unchecked_liveness(dst[i]);
                });
        });
        tracing::trace!(edges = len, "map_edges");
    }

    #[inline]
    fn local_unchecked_liveness(&self, id: IdType) -> IdType {
        let bucket = self.bucket(id);
        debug_assert!(
            bucket.id.load(Ordering::Acquire) == id,
            "edge endpoint {id} was never populated"
        );
        bucket.local.load(Ordering::Acquire)
    }

    /// Local ID of `global`, or `None` if it is unclaimed.
    ///
    /// A claim racing with this call reads as `None` until its local ID is
    /// stored.
    ///
    /// # Panics
    /// Panics if `global >= capacity`.
    pub fn lookup(&self, global: IdType) -> Option<IdType> {
        let bucket = self.bucket(global);
        if bucket.id.load(Ordering::Acquire) != global {
            return None;
        }
        let local = bucket.local.load(Ordering::Acquire);
        (local != EMPTY_KEY).then_some(local)
    }

    /// Global ID owning `local`, or `None` if `local >= num_items()`.
    ///
    /// A local ID handed out by a racing `insert` reads as `None` until its
    /// owner is stored.
    pub fn global_of(&self, local: IdType) -> Option<IdType> {
        if (local as usize) >= self.num_items() {
            return None;
        }
        let global = self.n2o[local as usize].global.load(Ordering::Acquire);
        (global != EMPTY_KEY).then_some(global)
    }

    /// Clears every claim so the table can serve the next batch.
    ///
    /// Resets the counter and every O2N slot across the full capacity,
    /// whatever the previous batch touched, plus the N2O prefix it used. No
    /// memory is released or reallocated.
    pub fn reset(&mut self, pool: &WorkerPool) {
        let used = self.num_items();
        let o2n = &*self.o2n;
        pool.for_each_index(self.capacity, |i| {
            o2n[i].id.store(EMPTY_KEY, Ordering::Relaxed);
            o2n[i].local.store(EMPTY_KEY, Ordering::Relaxed);
        });
        let n2o = &*self.n2o;
        pool.for_each_index(used, |i| {
            n2o[i].global.store(EMPTY_KEY, Ordering::Relaxed);
        });
        self.num_items.store(0, Ordering::Release);
        tracing::debug!(capacity = self.capacity, "remap table reset");
    }
}

impl core::fmt::Debug for IdRemapTable<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdRemapTable")
            .field("context", &self.context())
            .field("capacity", &self.capacity)
            .field("num_items", &self.num_items())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::SystemMemory;
    use crate::config::ParallelConfig;

    fn pool() -> WorkerPool {
        WorkerPool::new(ParallelConfig::default().with_num_threads(4).with_min_chunk(1)).unwrap()
    }

    #[test]
    fn insert_reports_first_claim_only() {
        let table = IdRemapTable::new(8);
        assert!(table.insert(5));
        assert!(!table.insert(5));
        assert_eq!(table.num_items(), 1);
        assert_eq!(table.lookup(5), Some(0));
        assert_eq!(table.lookup(4), None);
        assert_eq!(table.global_of(0), Some(5));
        assert_eq!(table.global_of(1), None);
    }

    #[test]
    fn scenario_small_batch() {
        let pool = pool();
        let table = IdRemapTable::new(10);
        table.populate(&pool, &[3, 5, 3, 7]);
        assert_eq!(table.num_items(), 3);

        let mut nodes = [0; 3];
        table.map_nodes(&pool, &mut nodes);
        let mut sorted = nodes;
        sorted.sort_unstable();
        assert_eq!(sorted, [3, 5, 7]);

        let (mut new_src, mut new_dst) = ([0; 2], [0; 2]);
        table.map_edges(&pool, &[3, 5], &[5, 7], &mut new_src, &mut new_dst);
        for (old, new) in [(3, new_src[0]), (5, new_src[1]), (5, new_dst[0]), (7, new_dst[1])] {
            assert_eq!(nodes[new as usize], old);
        }
    }

    #[test]
    fn reset_clears_claims_without_reallocating() {
        let pool = pool();
        let mem = SystemMemory::new();
        let mut table = IdRemapTable::with_memory(16, Context::Cpu, &mem).unwrap();
        let live = mem.live_bytes();

        table.populate(&pool, &[1, 2, 3]);
        table.reset(&pool);
        assert!(table.is_empty());
        assert_eq!(table.lookup(2), None);
        assert_eq!(mem.live_bytes(), live);

        table.populate(&pool, &[9]);
        assert_eq!(table.lookup(9), Some(0));
    }

    #[test]
    fn reset_leaves_no_stale_ids_behind() {
        let pool = pool();
        let mut table = IdRemapTable::new(8);
        table.populate(&pool, &[6, 2]);
        table.reset(&pool);

        for bucket in table.o2n.iter() {
            assert_eq!(bucket.id.load(Ordering::Relaxed), EMPTY_KEY);
            assert_eq!(bucket.local.load(Ordering::Relaxed), EMPTY_KEY);
        }
        assert!(table.n2o.iter().all(|b| b.global.load(Ordering::Relaxed) == EMPTY_KEY));
    }

    #[test]
    fn point_reads_hide_a_claim_until_it_is_published() {
        let table = IdRemapTable::new(4);
        // Simulate an `insert` caught between its CAS and its stores.
        table.o2n[3].id.store(3, Ordering::Release);
        table.num_items.fetch_add(1, Ordering::AcqRel);

        assert_eq!(table.lookup(3), None);
        assert_eq!(table.global_of(0), None);
        assert_eq!(table.num_items(), 1);
    }

    #[test]
    fn buffers_are_released_on_drop() {
        let mem = SystemMemory::new();
        {
            let _table = IdRemapTable::with_memory(32, Context::Gpu(1), &mem).unwrap();
            assert_eq!(mem.live_allocations(), 2);
        }
        assert_eq!(mem.live_allocations(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn populate_rejects_ids_past_capacity() {
        let table = IdRemapTable::new(4);
        table.populate(&pool(), &[1, 4]);
    }

    #[test]
    #[should_panic(expected = "only 1 are mapped")]
    fn map_nodes_rejects_reads_past_num_items() {
        let pool = pool();
        let table = IdRemapTable::new(4);
        table.populate(&pool, &[2]);
        let mut out = [0; 2];
        table.map_nodes(&pool, &mut out);
    }

    #[test]
    #[should_panic(expected = "differ in length")]
    fn map_edges_rejects_mismatched_lengths() {
        let pool = pool();
        let table = IdRemapTable::new(4);
        table.populate(&pool, &[0, 1]);
        let (mut a, mut b) = ([0; 2], [0; 1]);
        table.map_edges(&pool, &[0, 1], &[1, 0], &mut a, &mut b);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "never populated")]
    fn map_edges_flags_unclaimed_endpoints_in_debug() {
        let pool = pool();
        let table = IdRemapTable::new(4);
        table.populate(&pool, &[0]);
        let (mut a, mut b) = ([0; 1], [0; 1]);
        table.map_edges(&pool, &[0], &[3], &mut a, &mut b);
    }

    #[test]
    fn zero_capacity_table_is_usable() {
        let pool = pool();
        let mut table = IdRemapTable::new(0);
        table.populate(&pool, &[]);
        assert!(table.unique_nodes(&pool).is_empty());
        table.reset(&pool);
    }
}
