use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use undine_mesh::BuildScratch;

/// Lock-free pool reusing mesh scratch across rebuild jobs. Geometry
/// buffers keep their grown capacity between owners, so steady-state
/// rebuilds stop allocating.
pub struct ScratchPool {
    available_tx: Sender<BuildScratch>,
    available_rx: Receiver<BuildScratch>,
    allocated: AtomicUsize,
    max_scratches: usize,
}

impl ScratchPool {
    pub fn new(max_scratches: usize) -> Self {
        debug_assert!(max_scratches > 0);
        let (tx, rx) = bounded(max_scratches);
        Self {
            available_tx: tx,
            available_rx: rx,
            allocated: AtomicUsize::new(0),
            max_scratches,
        }
    }

    pub fn with_capacity_from_workers(worker_count: usize) -> Arc<Self> {
        Arc::new(Self::new(worker_count.max(1) * 2))
    }

    /// Acquire a scratch, creating a new one while under capacity.
    /// Blocks when every scratch is checked out.
    pub fn acquire<'pool>(&'pool self) -> PooledScratch<'pool> {
        if let Ok(scratch) = self.available_rx.try_recv() {
            return PooledScratch {
                scratch: Some(scratch),
                pool: self,
            };
        }

        loop {
            let current = self.allocated.load(Ordering::Acquire);
            if current < self.max_scratches {
                let prev = self.allocated.fetch_add(1, Ordering::AcqRel);
                if prev < self.max_scratches {
                    return PooledScratch {
                        scratch: Some(BuildScratch::new()),
                        pool: self,
                    };
                }
                self.allocated.fetch_sub(1, Ordering::AcqRel);
            }

            match self.available_rx.recv() {
                Ok(scratch) => {
                    return PooledScratch {
                        scratch: Some(scratch),
                        pool: self,
                    };
                }
                Err(_) => continue,
            }
        }
    }

    /// Scratches created so far; never exceeds the pool limit.
    pub fn allocated_count(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    fn release(&self, scratch: BuildScratch) {
        let _ = self.available_tx.send(scratch);
    }
}

/// Exclusive handle to one pooled scratch; returns it on drop.
pub struct PooledScratch<'pool> {
    scratch: Option<BuildScratch>,
    pool: &'pool ScratchPool,
}

impl<'pool> Deref for PooledScratch<'pool> {
    type Target = BuildScratch;

    fn deref(&self) -> &Self::Target {
        self.scratch.as_ref().expect("scratch already released")
    }
}

impl<'pool> DerefMut for PooledScratch<'pool> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.scratch.as_mut().expect("scratch already released")
    }
}

impl<'pool> Drop for PooledScratch<'pool> {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            self.pool.release(scratch);
        }
    }
}
