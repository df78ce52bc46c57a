//! Recycling pool of [`Job`]s.
//!
//! The pool is pre-filled and grows on demand. Released jobs are reset and
//! handed out again, so steady-state processing does not allocate.

use crate::job::Job;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Thread-safe free list of boxed jobs.
#[derive(Debug)]
pub struct JobPool {
    free: Mutex<Vec<Box<Job>>>,
    payload_words: usize,
    allocated: AtomicUsize,
}

impl JobPool {
    /// Creates a pool holding `prefill` jobs sized for `payload_words` words.
    #[must_use]
    pub fn new(prefill: usize, payload_words: usize) -> Self {
        let free = (0..prefill)
            .map(|_| Box::new(Job::with_capacity(payload_words)))
            .collect();
        Self {
            free: Mutex::new(free),
            payload_words,
            allocated: AtomicUsize::new(prefill),
        }
    }

    /// Takes a job from the pool, allocating a new one if the pool is empty.
    ///
    /// A job is held by at most one party at a time.
    pub fn acquire(&self) -> Box<Job> {
        if let Some(job) = self.free.lock().pop() {
            return job;
        }
        let total = self.allocated.fetch_add(1, Ordering::Relaxed) + 1;
        log::trace!("Job pool exhausted, allocating job {total}");
        Box::new(Job::with_capacity(self.payload_words))
    }

    /// Returns a job to the pool after resetting it.
    pub fn release(&self, mut job: Box<Job>) {
        job.reset();
        self.free.lock().push(job);
    }

    /// Jobs currently idle in the pool.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Jobs ever created by the pool.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prefill_and_growth() {
        let pool = JobPool::new(2, 16);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.allocated(), 2);

        let a = pool.acquire();
        let b = pool.acquire();
        let c = pool.acquire();
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.allocated(), 3);

        pool.release(a);
        pool.release(b);
        pool.release(c);
        assert_eq!(pool.available(), 3);
        assert_eq!(pool.allocated(), 3);
    }

    #[test]
    fn test_acquired_jobs_are_distinct() {
        let pool = JobPool::new(4, 16);
        let jobs: Vec<_> = (0..6).map(|_| pool.acquire()).collect();
        let addresses: HashSet<*const Job> = jobs.iter().map(|job| &**job as *const Job).collect();
        assert_eq!(addresses.len(), 6);
    }

    #[test]
    fn test_released_job_is_reused_clean() {
        let pool = JobPool::new(0, 16);
        let mut job = pool.acquire();
        job.words.push(7);
        job.events.push(1, 2, 3);
        let address = &*job as *const Job;
        pool.release(job);

        let job = pool.acquire();
        assert_eq!(&*job as *const Job, address);
        assert!(job.words.is_empty());
        assert!(job.events.is_empty());
        assert_eq!(pool.allocated(), 1);
    }
}
