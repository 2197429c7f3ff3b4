use std::sync::{Arc, Condvar, Mutex};

/// Monitor protecting the pending-task queue: a locked buffer plus the
/// condvar the launcher parks on.
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    cond: Condvar,
}

struct QueueState<T> {
    pending: Vec<Arc<T>>,
    stopping: bool,
    /// Forced shutdown: pending work is dropped instead of drained.
    abandoned: bool,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: Vec::new(),
                stopping: false,
                abandoned: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Append a task and wake the launcher. Non-blocking.
    pub fn push(&self, task: Arc<T>) {
        let mut state = self.state.lock().expect("task queue lock poisoned");
        state.pending.push(task);
        self.cond.notify_one();
    }

    /// Block until there is work or the queue is closed. Drains the whole
    /// queue in one step so tasks appended mid-batch are never lost, only
    /// deferred to the next batch. Returns `None` once the queue is closed
    /// and nothing is left to drain.
    pub fn wait_batch(&self) -> Option<Vec<Arc<T>>> {
        let mut state = self.state.lock().expect("task queue lock poisoned");
        loop {
            if state.abandoned {
                return None;
            }
            if !state.pending.is_empty() {
                return Some(std::mem::take(&mut state.pending));
            }
            if state.stopping {
                return None;
            }
            state = self.cond.wait(state).expect("task queue lock poisoned");
        }
    }

    /// Stop the launcher once the queue drains. Graceful: anything already
    /// pending is still handed out.
    pub fn close(&self) {
        let mut state = self.state.lock().expect("task queue lock poisoned");
        state.stopping = true;
        self.cond.notify_all();
    }

    /// Stop the launcher and drop everything still pending. Returns the
    /// number of abandoned tasks.
    pub fn close_abandoning(&self) -> usize {
        let mut state = self.state.lock().expect("task queue lock poisoned");
        state.stopping = true;
        state.abandoned = true;
        let dropped = state.pending.len();
        state.pending.clear();
        self.cond.notify_all();
        dropped
    }
}
