//! Cooperative deferred tasks, resumed by the frame loop.
//!
//! A task scheduled with a delay becomes due once that much simulated time
//! has been advanced. Nothing sleeps; `advance` is polled once per frame.

/// Handle returned by [`Scheduler::schedule`], used to cancel a pending task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Pending<T> {
    handle: TaskHandle,
    resume_at: f64,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: f64,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Schedules `task` to become due `delay` seconds from now.
    /// A zero delay fires on the next `advance`, never inside the current frame.
    pub fn schedule(&mut self, delay: f32, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            resume_at: self.now + delay.max(0.0) as f64,
            task,
        });
        handle
    }

    /// Removes a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advances the clock and returns every task that became due, in the
    /// order they were scheduled.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        self.now += dt.max(0.0) as f64;

        let now = self.now;
        let mut due = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for p in self.pending.drain(..) {
            if p.resume_at <= now {
                due.push(p.task);
            } else {
                still_pending.push(p);
            }
        }
        self.pending = still_pending;
        due
    }
}
