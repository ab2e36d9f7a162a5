//! Bounded worker pool for connection handling.
//!
//! # Responsibilities
//! - Cap the number of connections handled concurrently at `max_threads`
//! - Queue excess work until a worker frees up
//! - Expose queue and completion counters for diagnostics
//!
//! # Design Decisions
//! - Each submitted job is its own tokio task holding a semaphore permit;
//!   the permit is released on drop, so a panicking job frees its slot
//! - Submission never blocks the caller; waiting happens inside the task

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct PoolStats {
    queued: AtomicUsize,
    running: AtomicUsize,
    completed: AtomicU64,
}

/// Fixed-size pool of connection workers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
    stats: Arc<PoolStats>,
}

impl WorkerPool {
    /// Pool with `size` workers (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.stats.queued.load(Ordering::Relaxed)
    }

    /// Jobs currently holding a worker.
    pub fn running(&self) -> usize {
        self.stats.running.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.stats.completed.load(Ordering::Relaxed)
    }

    /// Queue `job`; it runs once a worker is free.
    pub fn submit<F>(&self, job: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let stats = Arc::clone(&self.stats);
        stats.queued.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            let permit = permits.acquire_owned().await;
            stats.queued.fetch_sub(1, Ordering::Relaxed);
            // The semaphore is never closed.
            let Ok(_permit) = permit else {
                return;
            };

            stats.running.fetch_add(1, Ordering::Relaxed);
            let _running = RunningGuard(&stats);
            job.await;
        })
    }
}

struct RunningGuard<'a>(&'a PoolStats);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::Relaxed);
        self.0.completed.fetch_add(1, Ordering::Relaxed);
    }
}
