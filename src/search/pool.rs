//! A priority-ordered worker pool used to explore the search DAG concurrently.
//!
//! Jobs are ordered by an `i64` priority (higher runs first), matching the convention used
//! throughout this crate of passing `-heuristic.compute_cost(node)` as a job's priority, so
//! that the lowest-cost node is always explored next.

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::error::Error;

type Job = Box<dyn FnOnce() + Send>;

struct ScoredJob {
    priority: i64,
    job: Job,
}

impl PartialEq for ScoredJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}
impl Eq for ScoredJob {}
impl PartialOrd for ScoredJob {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScoredJob {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority.cmp(&other.priority)
    }
}

struct Shared {
    queue: Mutex<BinaryHeap<ScoredJob>>,
    cond: Condvar,
    stopping: AtomicBool,
    queue_open: AtomicBool,
    busy_workers: AtomicUsize,
}

/// A fixed-size pool of worker threads draining a shared priority queue.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    num_threads: usize,
    started: AtomicBool,
}

impl ThreadPool {
    /// Create a new pool with `num_threads` workers. Workers are not spawned until [`start`]
    /// is called.
    ///
    /// [`start`]: ThreadPool::start
    pub fn new(num_threads: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(BinaryHeap::new()),
                cond: Condvar::new(),
                stopping: AtomicBool::new(false),
                queue_open: AtomicBool::new(true),
                busy_workers: AtomicUsize::new(0),
            }),
            workers: Mutex::new(Vec::new()),
            num_threads: num_threads.max(1),
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the worker threads. Returns [`Error::PoolAlreadyStarted`] if called twice.
    pub fn start(&self) -> Result<(), Error> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::PoolAlreadyStarted);
        }
        let mut workers = self.workers.lock().unwrap();
        for _ in 0..self.num_threads {
            let shared = Arc::clone(&self.shared);
            workers.push(std::thread::spawn(move || worker_loop(shared)));
        }
        Ok(())
    }

    /// Submit a job with the given priority. Returns [`Error::QueueClosed`] once
    /// [`close_queue`](Self::close_queue) has been called.
    pub fn add_job(&self, priority: i64, job: impl FnOnce() + Send + 'static) -> Result<(), Error> {
        if !self.shared.queue_open.load(Ordering::SeqCst) {
            return Err(Error::QueueClosed);
        }
        let mut queue = self.shared.queue.lock().unwrap();
        queue.push(ScoredJob { priority, job: Box::new(job) });
        self.shared.cond.notify_one();
        Ok(())
    }

    /// Stop accepting new jobs. Workers keep draining what remains queued.
    pub fn close_queue(&self) {
        self.shared.queue_open.store(false, Ordering::SeqCst);
        self.shared.cond.notify_all();
    }

    /// Signal all workers to stop as soon as the queue is drained, without waiting.
    pub fn stop(&self) {
        self.shared.stopping.store(true, Ordering::SeqCst);
        self.shared.cond.notify_all();
    }

    /// Close the queue, wait for it to drain, stop the workers, and join every thread.
    pub fn finish(&self) {
        self.close_queue();
        loop {
            let queue = self.shared.queue.lock().unwrap();
            if queue.is_empty() && self.shared.busy_workers.load(Ordering::SeqCst) == 0 {
                break;
            }
            drop(queue);
            std::thread::yield_now();
        }
        self.stop();
        let mut workers = self.workers.lock().unwrap();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if let Some(scored) = queue.pop() {
                    shared.busy_workers.fetch_add(1, Ordering::SeqCst);
                    break Some(scored.job);
                }
                if shared.stopping.load(Ordering::SeqCst) && !shared.queue_open.load(Ordering::SeqCst) {
                    break None;
                }
                let (guard, _timeout) = shared
                    .cond
                    .wait_timeout(queue, std::time::Duration::from_millis(50))
                    .unwrap();
                queue = guard;
                if shared.stopping.load(Ordering::SeqCst) && queue.is_empty() {
                    break None;
                }
            }
        };
        match job {
            Some(job) => {
                job();
                shared.busy_workers.fetch_sub(1, Ordering::SeqCst);
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI64;

    #[test]
    fn runs_all_submitted_jobs() {
        let pool = ThreadPool::new(2);
        pool.start().unwrap();
        let total = Arc::new(AtomicI64::new(0));
        for i in 0..10 {
            let total = Arc::clone(&total);
            pool.add_job(i, move || {
                total.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.finish();
        assert_eq!(total.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn rejects_jobs_after_close() {
        let pool = ThreadPool::new(1);
        pool.start().unwrap();
        pool.close_queue();
        let err = pool.add_job(0, || {}).unwrap_err();
        assert!(matches!(err, Error::QueueClosed));
        pool.finish();
    }

    #[test]
    fn rejects_double_start() {
        let pool = ThreadPool::new(1);
        pool.start().unwrap();
        assert!(pool.start().is_err());
        pool.finish();
    }
}
