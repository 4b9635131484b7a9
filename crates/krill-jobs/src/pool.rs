//! The worker pool and its job slab.
//!
//! Jobs live in a slab owned by the pool behind one mutex. The ready
//! list is an index-linked LIFO threaded through the slots; children are
//! slot indices with a pending-parent count. Workers block on a condvar
//! when idle and receive one wake-up per submitted job. A separate
//! condvar serves [`ThreadPool::wait`], signalled when the ready list is
//! drained and the remaining-job counter reaches zero.
//!
//! Shutdown drains the ready list: [`ThreadPool::stop`] raises the stop
//! flag, wakes every worker, and joins them once no ready job is left.
//! [`ThreadPool::restart`] spawns a fresh worker set.

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

thread_local! {
    /// Identity of the pool this thread works for (0 when not a worker);
    /// lets `wait()` catch the called-from-inside-a-job deadlock in
    /// debug builds.
    static WORKER_OF: Cell<usize> = const { Cell::new(0) };
}

/// Token for a job created with [`ThreadPool::create_job`].
///
/// Valid until the job has run; the slot is recycled afterwards.
#[derive(Clone, Copy, Debug)]
pub struct Job {
    index: usize,
}

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Slot {
    task: Option<Task>,
    next_ready: Option<usize>,
    pending_parents: usize,
    children: Vec<usize>,
    /// Counted toward the remaining-job counter.
    queued: bool,
}

#[derive(Default)]
struct State {
    slots: Vec<Slot>,
    free: Vec<usize>,
    ready_head: Option<usize>,
}

struct Shared {
    state: Mutex<State>,
    work_available: Condvar,
    all_done: Condvar,
    remaining: AtomicUsize,
    stop: AtomicBool,
}

/// Fixed-size worker pool executing job DAGs.
///
/// # Panic policy
///
/// A callable that panics aborts the process. Workers are therefore
/// never silently destroyed; an implementation that must survive
/// panicking jobs should catch inside the callable itself.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    thread_count: usize,
}

impl ThreadPool {
    /// Create a pool with `threads` workers, defaulting to hardware
    /// parallelism minus one (minimum one).
    pub fn new(threads: Option<usize>) -> Self {
        let thread_count = threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get().saturating_sub(1))
                    .unwrap_or(1)
            })
            .max(1);

        let mut pool = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                work_available: Condvar::new(),
                all_done: Condvar::new(),
                remaining: AtomicUsize::new(0),
                stop: AtomicBool::new(false),
            }),
            workers: Vec::with_capacity(thread_count),
            thread_count,
        };
        pool.restart();
        pool
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Jobs submitted but not yet completed.
    pub fn pending_jobs(&self) -> usize {
        self.shared.remaining.load(Ordering::Acquire)
    }

    /// Package `f` as a job, push it to the ready list, and wake one
    /// worker.
    pub fn submit<F: FnOnce() + Send + 'static>(&self, f: F) {
        let mut state = self.lock_state();
        let index = allocate_slot(&mut state, Box::new(f));
        state.slots[index].queued = true;
        self.shared.remaining.fetch_add(1, Ordering::AcqRel);
        push_ready(&mut state, index);
        self.shared.work_available.notify_one();
    }

    /// Allocate a job without submitting it, so children can be attached
    /// first.
    pub fn create_job<F: FnOnce() + Send + 'static>(&self, f: F) -> Job {
        let mut state = self.lock_state();
        let index = allocate_slot(&mut state, Box::new(f));
        Job { index }
    }

    /// Register `child` as a dependent of `parent`.
    ///
    /// The child starts only after every parent has returned. Children
    /// must be attached before the parent (or any ancestor) is
    /// submitted; attaching afterwards is a caller contract violation
    /// (debug assert).
    pub fn add_child(&self, parent: Job, child: Job) {
        let mut state = self.lock_state();
        debug_assert!(
            !state.slots[parent.index].queued,
            "children must be attached before the parent is submitted"
        );
        state.slots[child.index].pending_parents += 1;
        state.slots[parent.index].children.push(child.index);
    }

    /// Submit a job created with [`ThreadPool::create_job`].
    ///
    /// Every transitively attached child is counted toward the
    /// remaining-job counter now; children run once their parents have
    /// all returned.
    pub fn submit_job(&self, job: Job) {
        let mut state = self.lock_state();
        debug_assert!(
            !state.slots[job.index].queued,
            "job submitted twice"
        );
        debug_assert_eq!(
            state.slots[job.index].pending_parents, 0,
            "submit the DAG root; children run via their parents"
        );

        let mut counted = 0usize;
        state.slots[job.index].queued = true;
        let mut stack = vec![job.index];
        while let Some(index) = stack.pop() {
            let children = state.slots[index].children.clone();
            for child in children {
                if !state.slots[child].queued {
                    state.slots[child].queued = true;
                    counted += 1;
                    stack.push(child);
                }
            }
        }

        self.shared.remaining.fetch_add(1 + counted, Ordering::AcqRel);
        push_ready(&mut state, job.index);
        self.shared.work_available.notify_one();
    }

    /// Block until the ready list is empty and every counted job has
    /// completed.
    ///
    /// Safe to call concurrently with submissions from the same thread.
    /// Calling it from inside a job running on this pool would deadlock;
    /// debug builds panic instead, making the misuse observable.
    pub fn wait(&self) {
        debug_assert!(
            WORKER_OF.get() != Arc::as_ptr(&self.shared) as usize,
            "wait() called from inside a job on the same pool would deadlock"
        );
        let mut state = self.lock_state();
        while state.ready_head.is_some() || self.shared.remaining.load(Ordering::Acquire) != 0 {
            state = self
                .shared
                .all_done
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Raise the stop flag, wake every worker, and join them.
    ///
    /// Workers drain the ready list before exiting; jobs already running
    /// complete normally. The pool is inert afterwards until
    /// [`ThreadPool::restart`].
    pub fn stop(&mut self) {
        {
            let _guard = self.lock_state();
            self.shared.stop.store(true, Ordering::Release);
            self.shared.work_available.notify_all();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        self.shared.stop.store(false, Ordering::Release);
    }

    /// Spawn a fresh worker set after [`ThreadPool::stop`].
    pub fn restart(&mut self) {
        debug_assert!(self.workers.is_empty(), "restart with workers still running");
        for _ in 0..self.thread_count {
            let shared = Arc::clone(&self.shared);
            self.workers.push(std::thread::spawn(move || worker(shared)));
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Take a slot from the free list or grow the slab.
fn allocate_slot(state: &mut State, task: Task) -> usize {
    match state.free.pop() {
        Some(index) => {
            state.slots[index].task = Some(task);
            index
        }
        None => {
            state.slots.push(Slot {
                task: Some(task),
                ..Slot::default()
            });
            state.slots.len() - 1
        }
    }
}

/// Push a slot onto the ready LIFO.
fn push_ready(state: &mut State, index: usize) {
    state.slots[index].next_ready = state.ready_head;
    state.ready_head = Some(index);
}

/// Return a finished slot to the free list.
fn release_slot(state: &mut State, index: usize) {
    let slot = &mut state.slots[index];
    slot.task = None;
    slot.next_ready = None;
    slot.pending_parents = 0;
    slot.children.clear();
    slot.queued = false;
    state.free.push(index);
}

fn worker(shared: Arc<Shared>) {
    WORKER_OF.set(Arc::as_ptr(&shared) as usize);

    loop {
        // Pop the next ready job, or exit once stopped with nothing left.
        let (index, task) = {
            let mut state = shared
                .state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            loop {
                if let Some(index) = state.ready_head {
                    state.ready_head = state.slots[index].next_ready;
                    let task = state.slots[index].task.take().expect("ready job has a task");
                    break (index, task);
                }
                if shared.stop.load(Ordering::Acquire) {
                    return;
                }
                state = shared
                    .work_available
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
        };

        // Run outside the lock. Panic policy: terminate the process.
        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            std::process::abort();
        }

        // Completion: release dependents, recycle the slot, settle counts.
        let mut state = shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let children = std::mem::take(&mut state.slots[index].children);
        for child in children {
            state.slots[child].pending_parents -= 1;
            if state.slots[child].pending_parents == 0 {
                push_ready(&mut state, child);
                shared.work_available.notify_one();
            }
        }
        release_slot(&mut state, index);

        let previous = shared.remaining.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 && state.ready_head.is_none() {
            shared.all_done.notify_all();
        }
    }
}
