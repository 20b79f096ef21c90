//! A run-once computation that any thread may drive.
//!
//! The first caller of [`ThreadInheritingPriorityFuture::run_and_get`] runs
//! the task inline. Later callers block until it finishes and, while they
//! wait, lend their thread priority to the running thread.

use crate::scheduler::{NoopPriorityController, ThreadPriorityController};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

type Task<T> = Box<dyn FnOnce() -> T + Send + 'static>;

enum FutureState<T> {
    NotStarted(Task<T>),
    Running { thread: ThreadId },
    Done(T),
    Released,
}

impl<T> FutureState<T> {
    fn name(&self) -> &'static str {
        match self {
            FutureState::NotStarted(_) => "not started",
            FutureState::Running { .. } => "running",
            FutureState::Done(_) => "done",
            FutureState::Released => "released",
        }
    }
}

pub struct ThreadInheritingPriorityFuture<T> {
    description: &'static str,
    state: Mutex<FutureState<T>>,
    finished: Condvar,
    priorities: Arc<dyn ThreadPriorityController>,
}

impl<T: Clone + Send + 'static> ThreadInheritingPriorityFuture<T> {
    pub fn new(description: &'static str, task: impl FnOnce() -> T + Send + 'static) -> Self {
        Self::with_priority_controller(description, Arc::new(NoopPriorityController), task)
    }

    pub fn with_priority_controller(
        description: &'static str,
        priorities: Arc<dyn ThreadPriorityController>,
        task: impl FnOnce() -> T + Send + 'static,
    ) -> Self {
        Self {
            description,
            state: Mutex::new(FutureState::NotStarted(Box::new(task))),
            finished: Condvar::new(),
            priorities,
        }
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    fn lock(&self) -> MutexGuard<'_, FutureState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the result, computing it on this thread if nobody has started
    /// yet. Returns `None` once the future is released.
    pub fn run_and_get(&self) -> Option<T> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, FutureState::Released) {
            FutureState::NotStarted(task) => {
                *state = FutureState::Running {
                    thread: thread::current().id(),
                };
                drop(state);
                self.run_inline(task)
            }
            FutureState::Running { thread } => {
                *state = FutureState::Running { thread };
                self.wait_for(state, thread)
            }
            FutureState::Done(value) => {
                *state = FutureState::Done(value.clone());
                Some(value)
            }
            FutureState::Released => None,
        }
    }

    fn run_inline(&self, task: Task<T>) -> Option<T> {
        log::trace!("{} running on {:?}", self.description, thread::current().id());
        let mut guard = RunGuard {
            future: self,
            finished: false,
        };
        let value = task();
        guard.finished = true;

        let mut state = self.lock();
        let kept = !matches!(*state, FutureState::Released);
        if kept {
            *state = FutureState::Done(value.clone());
        } else {
            log::debug!("{} finished after release, dropping result", self.description);
        }
        drop(state);
        self.finished.notify_all();
        kept.then_some(value)
    }

    fn wait_for(&self, mut state: MutexGuard<'_, FutureState<T>>, runner: ThreadId) -> Option<T> {
        if runner == thread::current().id() {
            log::warn!("{} awaited from inside its own task", self.description);
            return None;
        }
        let donated = self.donate_priority(runner);
        let result = loop {
            state = self
                .finished
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match &*state {
                FutureState::Done(value) => break Some(value.clone()),
                FutureState::Released => break None,
                _ => {}
            }
        };
        drop(state);
        if let Some(previous) = donated {
            self.priorities.set_priority(runner, previous);
        }
        result
    }

    /// Raises `runner` to this thread's priority. Returns the priority to
    /// restore afterwards.
    fn donate_priority(&self, runner: ThreadId) -> Option<i32> {
        let waiter = self.priorities.current_priority();
        let previous = self.priorities.priority_of(runner);
        if waiter > previous {
            log::trace!(
                "{} raising {:?} from {previous} to {waiter}",
                self.description,
                runner
            );
            self.priorities.set_priority(runner, waiter);
            Some(previous)
        } else {
            None
        }
    }

    /// Cancels the task if it has not started and discards any result.
    pub fn release(&self) {
        let mut state = self.lock();
        if !matches!(*state, FutureState::Released) {
            log::trace!("{} released while {}", self.description, state.name());
            *state = FutureState::Released;
        }
        drop(state);
        self.finished.notify_all();
    }

    pub fn is_done(&self) -> bool {
        matches!(*self.lock(), FutureState::Done(_))
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock(), FutureState::Running { .. })
    }

    pub fn is_released(&self) -> bool {
        matches!(*self.lock(), FutureState::Released)
    }
}

impl<T> fmt::Debug for ThreadInheritingPriorityFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f.debug_struct("ThreadInheritingPriorityFuture")
            .field("description", &self.description)
            .field("state", &state.name())
            .finish()
    }
}

/// Releases the future if its task unwinds so waiters do not hang.
struct RunGuard<'a, T: Clone + Send + 'static> {
    future: &'a ThreadInheritingPriorityFuture<T>,
    finished: bool,
}

impl<T: Clone + Send + 'static> Drop for RunGuard<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.future.release();
        }
    }
}

#[cfg(test)]
#[path = "tests/future_tests.rs"]
mod tests;
