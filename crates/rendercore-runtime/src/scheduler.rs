//! Thread scheduling contracts used by the pipeline.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread::{self, ThreadId};

type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Access to the thread that owns the mounted hierarchy.
pub trait UiThreadScheduler: Send + Sync {
    fn is_ui_thread(&self) -> bool;

    /// Runs `task` on the UI thread at some later point.
    fn post(&self, task: UiTask);
}

/// Raises and restores thread priorities while one thread waits on another.
///
/// Larger values are more urgent.
pub trait ThreadPriorityController: Send + Sync {
    fn current_priority(&self) -> i32;

    fn priority_of(&self, thread: ThreadId) -> i32;

    fn set_priority(&self, thread: ThreadId, priority: i32);
}

/// Controller for platforms without thread priorities.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPriorityController;

impl ThreadPriorityController for NoopPriorityController {
    fn current_priority(&self) -> i32 {
        0
    }

    fn priority_of(&self, _thread: ThreadId) -> i32 {
        0
    }

    fn set_priority(&self, _thread: ThreadId, _priority: i32) {}
}

/// Scheduler whose UI thread is the thread that created it. Posted tasks
/// queue up until that thread calls [`ChannelUiScheduler::run_pending`].
pub struct ChannelUiScheduler {
    ui_thread_id: ThreadId,
    tx: Mutex<mpsc::Sender<UiTask>>,
    rx: Mutex<mpsc::Receiver<UiTask>>,
    pending: AtomicUsize,
}

impl ChannelUiScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            ui_thread_id: thread::current().id(),
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(0),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Runs every queued task. Returns how many ran. Does nothing off the
    /// UI thread.
    pub fn run_pending(&self) -> usize {
        if !self.is_ui_thread() {
            log::warn!("run_pending called off the UI thread");
            return 0;
        }
        let mut ran = 0;
        loop {
            let next = self
                .rx
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .try_recv();
            let Ok(task) = next else {
                break;
            };
            self.pending.fetch_sub(1, Ordering::SeqCst);
            task();
            ran += 1;
        }
        ran
    }
}

impl Default for ChannelUiScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChannelUiScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelUiScheduler")
            .field("ui_thread_id", &self.ui_thread_id)
            .field("pending", &self.pending.load(Ordering::SeqCst))
            .finish()
    }
}

impl UiThreadScheduler for ChannelUiScheduler {
    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread_id
    }

    fn post(&self, task: UiTask) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let sent = self
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .send(task);
        if sent.is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
