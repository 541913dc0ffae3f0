//! Timer schedulers.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use contexxt_protocols::{Scheduler, TimerHandle};

/// Runs callbacks on a tokio runtime after the requested delay.
///
/// A cancelled timer's task exits at once instead of sleeping out the delay.
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime of the calling task, if there is one.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let handle = TimerHandle::new();
        let guard = handle.clone();
        self.handle.spawn(async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(delay) => task(),
            }
        });
        handle
    }
}

struct PendingTask {
    due: Duration,
    seq: u64,
    handle: TimerHandle,
    task: Box<dyn FnOnce() + Send>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    pending: Vec<PendingTask>,
}

/// Virtual-time scheduler. Nothing runs until [`ManualScheduler::advance`].
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of scheduled, not yet cancelled callbacks.
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .pending
            .iter()
            .filter(|p| !p.handle.is_cancelled())
            .count()
    }

    /// Move virtual time forward, running every callback that falls due in order.
    ///
    /// Callbacks may schedule further callbacks; those run too if they fall
    /// inside the window.
    pub fn advance(&self, by: Duration) {
        let target = self.state.lock().now + by;
        loop {
            let next = {
                let mut state = self.state.lock();
                let idx = state
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(_, p)| (p.due, p.seq))
                    .map(|(i, _)| i);
                match idx {
                    Some(i) => {
                        let task = state.pending.swap_remove(i);
                        state.now = task.due;
                        Some(task)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };
            match next {
                Some(pending) if !pending.handle.is_cancelled() => (pending.task)(),
                Some(_) => continue,
                None => break,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut state = self.state.lock();
        state.seq += 1;
        let pending = PendingTask {
            due: state.now + delay,
            seq: state.seq,
            handle: handle.clone(),
            task,
        };
        state.pending.push(pending);
        handle
    }
}
