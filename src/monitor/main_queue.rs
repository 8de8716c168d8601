//! Main scheduling context
//!
//! Platform callbacks fire on threads the application does not own. Anything
//! that touches UI-visible state has to be marshalled back onto the one
//! thread that owns that state. `MainQueue` is that thread's task queue:
//! background code posts closures through a cloned [`MainContext`], and the
//! owning thread runs them when it pumps the queue.
//!
//! The queue is bounded. A context nobody pumps stops accepting tasks once
//! it is full instead of growing, and `post` reports the dropped task.

use std::sync::mpsc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use tracing::trace;

type Task = Box<dyn FnOnce() + Send>;

/// Default number of tasks a queue holds before `post` starts dropping them
pub const DEFAULT_CAPACITY: usize = 256;

/// Task queue drained by the thread that created it
pub struct MainQueue {
    sender: mpsc::SyncSender<Task>,
    receiver: mpsc::Receiver<Task>,
    owner: ThreadId,
}

/// Cloneable handle for posting tasks onto a [`MainQueue`]
#[derive(Clone)]
pub struct MainContext {
    sender: mpsc::SyncSender<Task>,
    owner: ThreadId,
}

impl MainQueue {
    /// Create a queue owned by the calling thread
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a queue owned by the calling thread that holds at most `capacity` tasks
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        Self {
            sender,
            receiver,
            owner: thread::current().id(),
        }
    }

    /// Handle for posting tasks from any thread
    pub fn context(&self) -> MainContext {
        MainContext {
            sender: self.sender.clone(),
            owner: self.owner,
        }
    }

    /// Thread that created the queue and runs its tasks
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Run every task already queued without blocking. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        if ran > 0 {
            trace!("Ran {ran} main-queue task(s)");
        }
        ran
    }

    /// Wait up to `timeout` for one task and run it. Returns whether a task ran.
    pub fn run_one_timeout(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(_) => false,
        }
    }

    /// Keep running tasks until none arrives for `idle`. Returns how many ran.
    pub fn run_until_idle_for(&self, idle: Duration) -> usize {
        let mut ran = 0;
        let mut deadline = Instant::now() + idle;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.run_one_timeout(remaining) {
                return ran;
            }
            ran += 1;
            deadline = Instant::now() + idle;
        }
    }
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainContext {
    /// Queue `task` to run on the owning thread without blocking
    ///
    /// Returns `false` and drops the task if the queue is full or gone.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        match self.sender.try_send(Box::new(task)) {
            Ok(()) => true,
            Err(mpsc::TrySendError::Full(_)) => {
                trace!("Main queue full, task dropped");
                false
            }
            Err(mpsc::TrySendError::Disconnected(_)) => false,
        }
    }

    /// Whether the calling thread is the one that runs posted tasks
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_tasks_run_on_owner_thread() {
        let queue = MainQueue::new();
        let context = queue.context();
        let ran_on = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&ran_on);
        thread::spawn(move || {
            assert!(!context.is_current());
            context.post(move || *slot.lock() = Some(thread::current().id()));
        })
        .join()
        .unwrap();

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*ran_on.lock(), Some(queue.owner()));
    }

    #[test]
    fn test_tasks_run_in_post_order() {
        let queue = MainQueue::new();
        let context = queue.context();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = Arc::clone(&order);
            context.post(move || order.lock().push(i));
        }

        assert_eq!(queue.run_pending(), 5);
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_run_one_timeout_without_tasks() {
        let queue = MainQueue::new();
        assert!(!queue.run_one_timeout(Duration::from_millis(10)));
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn test_post_after_queue_dropped() {
        let queue = MainQueue::new();
        let context = queue.context();
        drop(queue);
        assert!(!context.post(|| {}));
    }

    #[test]
    fn test_unpumped_queue_drops_tasks_when_full() {
        let queue = MainQueue::with_capacity(3);
        let context = queue.context();
        let ran = Arc::new(Mutex::new(0));

        let accepted = (0..10)
            .filter(|_| {
                let ran = Arc::clone(&ran);
                context.post(move || *ran.lock() += 1)
            })
            .count();

        assert_eq!(accepted, 3);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*ran.lock(), 3);

        // Draining makes room again
        assert!(context.post(|| {}));
    }

    #[test]
    fn test_run_until_idle_collects_delayed_tasks() {
        let queue = MainQueue::new();
        let context = queue.context();

        let producer = thread::spawn(move || {
            for _ in 0..3 {
                thread::sleep(Duration::from_millis(10));
                context.post(|| {});
            }
        });

        let ran = queue.run_until_idle_for(Duration::from_millis(500));
        producer.join().unwrap();
        assert_eq!(ran, 3);
    }
}
