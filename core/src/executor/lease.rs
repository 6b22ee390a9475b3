use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::ExecutorError;

/// Caps how many tasks execute at once. Holding a [`WorkerLease`] is the only way to
/// start task work.
#[derive(Debug, Clone)]
pub struct WorkerLeasePool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl WorkerLeasePool {
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
                in_use: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Waits (FIFO, without polling) until a lease is free.
    pub async fn acquire(&self) -> Result<WorkerLease, ExecutorError> {
        let permit = Arc::clone(&self.inner.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ExecutorError::LeasePoolClosed)?;
        Ok(self.lease(permit))
    }

    pub fn try_acquire(&self) -> Option<WorkerLease> {
        Arc::clone(&self.inner.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| self.lease(permit))
    }

    pub fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::SeqCst)
    }

    /// Highest number of leases held at the same time since the pool was created.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    fn lease(&self, permit: OwnedSemaphorePermit) -> WorkerLease {
        let now = self.inner.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
        WorkerLease {
            pool: Arc::clone(&self.inner),
            _permit: permit,
        }
    }
}

/// Capacity token; returned to the pool on drop.
#[derive(Debug)]
pub struct WorkerLease {
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for WorkerLease {
    fn drop(&mut self) {
        // the permit field drops after this, so in_use never exceeds capacity
        self.pool.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}
