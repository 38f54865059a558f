//! Work-stealing worker pool driving the parallel scan.
//!
//! Each worker owns a mutex-guarded deque. Submission is round-robin with a
//! per-queue cap; when every queue is saturated the submitting thread runs
//! the task inline, which keeps memory bounded and cannot deadlock even
//! though workers submit from inside tasks. Workers pop their own queue from
//! the front and steal from other queues' backs.

use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread::JoinHandle,
    time::Duration,
};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Total queued-task bound across all workers.
const QUEUE_CAP: usize = 50_000;

/// How long an idle worker parks before re-checking for work or stop.
const IDLE_WAIT: Duration = Duration::from_millis(10);

struct WorkQueue {
    tasks: Mutex<VecDeque<Task>>,
    // Mirrors tasks.len() so saturation checks stay lock-free.
    len: AtomicUsize,
}

struct Shared {
    queues: Vec<WorkQueue>,
    per_queue_cap: usize,
    next_queue: AtomicUsize,
    // Queued plus in-flight tasks; join() waits for this to reach zero.
    pending: AtomicUsize,
    stop: AtomicBool,
    work_lock: Mutex<()>,
    work_available: Condvar,
    done_lock: Mutex<()>,
    all_done: Condvar,
}

impl Shared {
    fn finish_task(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _guard = self.done_lock.lock();
            self.all_done.notify_all();
        }
    }

    fn run_task(&self, task: Task) {
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            warn!("worker task panicked; continuing");
        }
        self.finish_task();
    }
}

/// Cloneable submission handle, safe to use from inside a running task.
#[derive(Clone)]
pub struct PoolHandle {
    shared: Arc<Shared>,
}

impl PoolHandle {
    /// Place a task on some queue and wake a worker. When every queue is at
    /// its cap the task runs inline on the calling thread.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = &self.shared;
        if shared.stop.load(Ordering::Acquire) {
            return;
        }
        shared.pending.fetch_add(1, Ordering::SeqCst);

        let workers = shared.queues.len();
        let mut queue_id = shared.next_queue.fetch_add(1, Ordering::Relaxed) % workers;

        let mut chosen = None;
        for _ in 0..workers {
            if shared.queues[queue_id].len.load(Ordering::Relaxed) < shared.per_queue_cap {
                chosen = Some(queue_id);
                break;
            }
            queue_id = (queue_id + 1) % workers;
        }

        match chosen {
            Some(id) => {
                let queue = &shared.queues[id];
                queue.tasks.lock().push_back(Box::new(task));
                queue.len.fetch_add(1, Ordering::Relaxed);
                shared.work_available.notify_one();
            }
            // Backpressure: all queues saturated, execute in the caller.
            None => shared.run_task(Box::new(task)),
        }
    }
}

/// Fixed-size pool of worker threads with per-worker deques.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `threads` workers; 0 selects hardware parallelism (clamped to 3
    /// on macOS, where more scan threads hurt throughput).
    pub fn new(threads: usize) -> Self {
        let threads = if threads == 0 {
            default_thread_count()
        } else {
            threads
        };

        let queues = (0..threads)
            .map(|_| WorkQueue {
                tasks: Mutex::new(VecDeque::new()),
                len: AtomicUsize::new(0),
            })
            .collect();

        let shared = Arc::new(Shared {
            queues,
            per_queue_cap: (QUEUE_CAP / threads).max(1),
            next_queue: AtomicUsize::new(0),
            pending: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
            work_lock: Mutex::new(()),
            work_available: Condvar::new(),
            done_lock: Mutex::new(()),
            all_done: Condvar::new(),
        });

        let workers = (0..threads)
            .map(|id| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("duscan-worker-{id}"))
                    .spawn(move || worker_loop(id, &shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        debug!(threads, "worker pool started");
        Self { shared, workers }
    }

    pub fn handle(&self) -> PoolHandle {
        PoolHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Block until every submitted task (including tasks submitted by other
    /// tasks) has completed. Must not be called from a worker.
    pub fn join(&self) {
        let mut guard = self.shared.done_lock.lock();
        while self.shared.pending.load(Ordering::SeqCst) > 0 {
            self.shared
                .all_done
                .wait_for(&mut guard, Duration::from_millis(50));
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.work_available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(id: usize, shared: &Shared) {
    let my_queue = &shared.queues[id];

    while !shared.stop.load(Ordering::Acquire) {
        let task = {
            let mut tasks = my_queue.tasks.lock();
            match tasks.pop_front() {
                Some(task) => {
                    my_queue.len.fetch_sub(1, Ordering::Relaxed);
                    Some(task)
                }
                None => None,
            }
        };

        let task = match task {
            Some(task) => Some(task),
            None => try_steal(id, shared),
        };

        match task {
            Some(task) => shared.run_task(task),
            None => {
                let mut guard = shared.work_lock.lock();
                shared.work_available.wait_for(&mut guard, IDLE_WAIT);
            }
        }
    }
}

/// Steal from the back of another worker's queue, round-robin from the
/// thief's position.
fn try_steal(thief: usize, shared: &Shared) -> Option<Task> {
    let workers = shared.queues.len();
    for i in 1..workers {
        let victim = &shared.queues[(thief + i) % workers];
        if victim.len.load(Ordering::Relaxed) == 0 {
            continue;
        }
        if let Some(mut tasks) = victim.tasks.try_lock() {
            if let Some(task) = tasks.pop_back() {
                victim.len.fetch_sub(1, Ordering::Relaxed);
                return Some(task);
            }
        }
    }
    None
}

fn default_thread_count() -> usize {
    let n = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4);
    if cfg!(target_os = "macos") {
        n.min(3)
    } else {
        n
    }
}
