//! Single-threaded timer queue.
//!
//! Components never sleep. They schedule a continuation and keep the
//! returned [`TaskHandle`]; the handle is not `Clone`, and cancelling
//! consumes it, so a continuation can be cancelled at most once. The event
//! loop drains due tasks with [`Scheduler::pop_due`].

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Continuations scheduled by the session's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    PollFile,
    StreamTick,
}

/// Ownership of one pending continuation.
#[derive(Debug, PartialEq, Eq)]
pub struct TaskHandle {
    id: TaskId,
}

impl TaskHandle {
    /// True if this handle is the one that just fired.
    pub fn is(&self, fired: TaskId) -> bool {
        self.id == fired
    }
}

#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    queue: BTreeMap<(Instant, TaskId), T>,
    deadlines: HashMap<TaskId, Instant>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) -> TaskHandle {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let deadline = now + delay;
        self.queue.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        TaskHandle { id }
    }

    /// Cancels a pending continuation. Returns false if it already fired.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.deadlines.remove(&handle.id) {
            Some(deadline) => self.queue.remove(&(deadline, handle.id)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: &TaskHandle) -> bool {
        self.deadlines.contains_key(&handle.id)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes and returns the earliest task due at `now`, if any.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TaskId, T)> {
        let key = *self.queue.keys().next()?;
        if key.0 > now {
            return None;
        }
        let task = self.queue.remove(&key)?;
        self.deadlines.remove(&key.1);
        Some((key.1, task))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
