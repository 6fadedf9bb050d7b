//! # Bounded FIFO of boot tasks.
//!
//! Thread-safe: every operation takes the internal mutex. FIFO is the only
//! ordering guarantee; callers set priority by enqueue order.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::task::InitTask;
use crate::error::QueueError;

/// Default capacity of the boot queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Ordered, bounded queue of [`InitTask`]s.
pub struct TaskQueue {
    items: Mutex<VecDeque<InitTask>>,
    capacity: usize,
}

impl TaskQueue {
    /// Creates an empty queue holding at most `capacity` tasks (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Appends a task, failing with [`QueueError::Full`] at capacity.
    pub fn enqueue(&self, task: InitTask) -> Result<(), QueueError> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        items.push_back(task);
        Ok(())
    }

    /// Appends every task in order; stops at the first overflow.
    pub fn enqueue_all(&self, tasks: impl IntoIterator<Item = InitTask>) -> Result<(), QueueError> {
        for task in tasks {
            self.enqueue(task)?;
        }
        Ok(())
    }

    /// Pops the oldest task, or `None` when empty. Never blocks on emptiness.
    pub fn dequeue(&self) -> Option<InitTask> {
        self.items.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;

    fn task(name: &'static str) -> InitTask {
        InitTask::new(name, || async { Ok::<_, HookError>(()) })
    }

    #[test]
    fn fifo_order() {
        let q = TaskQueue::new(10);
        q.enqueue_all([task("a"), task("b"), task("c")]).unwrap();
        assert_eq!(q.len(), 3);

        let order: Vec<String> = std::iter::from_fn(|| q.dequeue())
            .map(|t| t.description().to_string())
            .collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert!(q.is_empty());
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn overflow_fails_loudly() {
        let q = TaskQueue::new(2);
        q.enqueue(task("a")).unwrap();
        q.enqueue(task("b")).unwrap();
        assert_eq!(q.enqueue(task("c")), Err(QueueError::Full { capacity: 2 }));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn default_capacity() {
        let q = TaskQueue::default();
        assert_eq!(q.capacity(), DEFAULT_QUEUE_CAPACITY);
        for i in 0..DEFAULT_QUEUE_CAPACITY {
            q.enqueue(InitTask::new(format!("t{i}"), || async { Ok(()) }))
                .unwrap();
        }
        assert!(q.enqueue(task("one too many")).is_err());
    }
}
