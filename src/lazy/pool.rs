use std::sync::Arc;

use crate::groups::group::GroupError;

/// Where asynchronous `compute()` requests run.
///
/// Synchronous evaluation always happens on the calling thread; the pool only ever sees work
/// that nobody is waiting for yet.
#[derive(Clone, Debug, Default)]
pub enum WorkerPool {
    /// rayon's global pool: one thread per available core, alive for the whole process.
    #[default]
    Shared,
    /// A pool owned by whoever holds handles to it; its threads exit once the last handle is
    /// dropped and the queued jobs have drained.
    Dedicated(Arc<rayon::ThreadPool>),
    /// Runs every job immediately on the thread that submits it.
    Inline,
}

impl WorkerPool {
    pub fn dedicated(threads: usize) -> Result<Self, GroupError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lazygroup-worker-{i}"))
            .build()
            .map(|pool| WorkerPool::Dedicated(Arc::new(pool)))
            .map_err(|e| GroupError::WorkerPool(e.to_string()))
    }

    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            WorkerPool::Shared => rayon::spawn(job),
            WorkerPool::Dedicated(pool) => pool.spawn(job),
            WorkerPool::Inline => job(),
        }
    }
}
