//! Fork-join parallel-for over independent array elements.
//!
//! A [`WorkerPool`] is the explicit replacement for a process-wide thread-count
//! knob: callers build one from a [`ParallelConfig`] and pass it to every table
//! operation. Using a pool with a different worker count on the next call needs
//! no cooperation from the table.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::config::ParallelConfig;

/// A rayon thread pool plus the chunking policy for parallel loops.
pub struct WorkerPool {
    pool: ThreadPool,
    min_chunk: usize,
}

impl WorkerPool {
    /// Builds a pool from `config`.
    ///
    /// # Errors
    /// Returns rayon's build error if worker threads cannot be spawned.
    pub fn new(config: ParallelConfig) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|i| format!("remap-worker-{i}"))
            .build()?;
        tracing::debug!(
            num_threads = pool.current_num_threads(),
            min_chunk = config.min_chunk,
            "worker pool ready"
        );
        Ok(Self {
            pool,
            min_chunk: config.min_chunk.max(1),
        })
    }

    /// Builds a pool with exactly `num_threads` workers and default chunking.
    ///
    /// # Errors
    /// Returns rayon's build error if worker threads cannot be spawned.
    pub fn with_threads(num_threads: usize) -> Result<Self, ThreadPoolBuildError> {
        Self::new(ParallelConfig::default().with_num_threads(num_threads))
    }

    /// Number of worker threads.
    #[inline]
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Minimum chunk length per worker.
    #[inline]
    pub fn min_chunk(&self) -> usize {
        self.min_chunk
    }

    /// Runs `op` inside the pool so nested rayon iterators use its workers.
    #[inline]
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Calls `f(i)` for every `i` in `0..len`, in parallel and in no particular order.
    pub fn for_each_index<F>(&self, len: usize, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        let min = self.min_chunk;
        self.pool
            .install(|| (0..len).into_par_iter().with_min_len(min).for_each(f));
    }

    /// Calls `f(i, &mut out[i])` for every element of `out`, in parallel.
    pub fn for_each_mut<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        let min = self.min_chunk;
        self.pool.install(|| {
            out.par_iter_mut()
                .with_min_len(min)
                .enumerate()
                .for_each(|(i, slot)| f(i, slot));
        });
    }
}

impl core::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads())
            .field("min_chunk", &self.min_chunk)
            .finish()
    }
}
