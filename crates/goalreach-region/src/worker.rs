//! Owned, joinable background threads driven by the store's task states.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use goalreach_core::GoalSpace;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::RegionError;
use crate::store::{GoalStore, RegionState, Task, TaskState};

/// Returns the task to `Idle` when the thread body finishes, panics included.
struct ExitGuard<G: GoalSpace> {
    store: Arc<GoalStore<G>>,
    task: Task,
}

impl<G: GoalSpace> Drop for ExitGuard<G> {
    fn drop(&mut self) {
        self.store.lock().set_task(self.task, TaskState::Idle);
        self.store.wakeup().notify_all();
    }
}

/// One background task slot. At most one thread runs per slot.
pub(crate) struct Worker<T> {
    task: Task,
    handle: Mutex<Option<JoinHandle<T>>>,
}

impl<T: Send + 'static> Worker<T> {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            handle: Mutex::new(None),
        }
    }

    /// Spawn `body` unless the task is already running.
    ///
    /// `prepare` runs under the store lock just before the task is marked
    /// running. Returns `Ok(false)` when the task was already running.
    pub fn start<G, P, F>(
        &self,
        store: &Arc<GoalStore<G>>,
        prepare: P,
        body: F,
    ) -> Result<bool, RegionError>
    where
        G: GoalSpace,
        P: FnOnce(&mut RegionState<G::State>),
        F: FnOnce(&Arc<GoalStore<G>>) -> T + Send + 'static,
    {
        let mut slot = self.handle.lock();

        if let Some(handle) = slot.take() {
            if store.task_state(self.task) == TaskState::Running && !handle.is_finished() {
                *slot = Some(handle);
                return Ok(false);
            }
            // The previous thread exited on its own or is on its way out. It may
            // still query this worker from a callback, so join without the slot lock.
            drop(slot);
            Self::join(self.task, handle);
            slot = self.handle.lock();
            if slot.is_some() {
                return Ok(false);
            }
        }

        {
            let mut guard = store.lock();
            prepare(&mut *guard);
            guard.set_task(self.task, TaskState::Running);
        }

        debug!("Starting {} thread", self.task.thread_name());
        let thread_store = Arc::clone(store);
        let task = self.task;
        let spawned = thread::Builder::new()
            .name(task.thread_name().to_string())
            .spawn(move || {
                let exit = ExitGuard {
                    store: thread_store,
                    task,
                };
                body(&exit.store)
            });

        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                Ok(true)
            }
            Err(e) => {
                store.lock().set_task(self.task, TaskState::Idle);
                Err(RegionError::Spawn(e))
            }
        }
    }

    /// Request the task to stop and wait for it to exit.
    ///
    /// Returns the thread's result, or `None` if it was never started. When called
    /// from the worker thread itself, only the request is made.
    pub fn stop<G: GoalSpace>(&self, store: &GoalStore<G>) -> Option<T> {
        {
            let mut guard = store.lock();
            if guard.task(self.task) == TaskState::Running {
                debug!("Attempting to stop {} thread...", self.task.thread_name());
                guard.set_task(self.task, TaskState::Stopping);
            }
        }
        store.wakeup().notify_all();

        let mut slot = self.handle.lock();
        let handle = slot.take()?;
        if handle.thread().id() == thread::current().id() {
            *slot = Some(handle);
            return None;
        }
        drop(slot);
        Self::join(self.task, handle)
    }

    /// Whether a thread is live and has not been asked to stop.
    pub fn is_running<G: GoalSpace>(&self, store: &GoalStore<G>) -> bool {
        let slot = self.handle.lock();
        slot.as_ref().is_some_and(|h| !h.is_finished())
            && store.task_state(self.task) == TaskState::Running
    }

    fn join(task: Task, handle: JoinHandle<T>) -> Option<T> {
        match handle.join() {
            Ok(result) => Some(result),
            Err(_) => {
                error!("{} thread panicked", task.thread_name());
                None
            }
        }
    }
}
