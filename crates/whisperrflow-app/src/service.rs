use std::sync::Arc;

use anyhow::{Context, Result};
use time::{OffsetDateTime, UtcOffset};
use whisperrflow_core::{
    Action, EntityRef, Outcome, ProjectId, ProjectProgress, Task, TaskId, TaskState, TaskStats, UserId,
};

use crate::clock::Clock;
use crate::snapshot::StateStore;
use crate::store::{DispatchError, DispatchResult, Store};
use crate::task_patch::TaskEdit;

/// Service façade that pairs the in-memory [`Store`] with a persistence backend.
///
/// Every operation that changes the state is followed by a save.
pub struct FlowService<S> {
    store: Store,
    backend: S,
}

impl<S> std::fmt::Debug for FlowService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S: StateStore> FlowService<S> {
    /// Load the saved state, or start an inbox-only workspace owned by `owner`.
    ///
    /// # Errors
    /// Returns an error if the backend holds a state that cannot be read.
    pub fn open(backend: S, clock: Arc<dyn Clock>, owner: UserId) -> Result<Self> {
        let state = match backend.load().context("failed to load task state")? {
            Some(state) => state,
            None => TaskState::new(owner, clock.now()),
        };
        Ok(Self {
            store: Store::with_clock(state, clock),
            backend,
        })
    }

    /// Underlying store, for subscriptions and reads.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> Arc<TaskState> {
        self.store.state()
    }

    /// Current time according to the service clock.
    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        self.store.now()
    }

    /// Run one or more action creators and persist if the state changed.
    ///
    /// # Errors
    /// Returns the [`DispatchError`] raised by `op`, or a persistence error.
    pub fn apply<T>(&mut self, op: impl FnOnce(&mut Store) -> DispatchResult<T>) -> Result<T> {
        let before = self.store.state();
        let result = op(&mut self.store);
        if !Arc::ptr_eq(&before, &self.store.state()) {
            self.save()?;
        }
        Ok(result?)
    }

    /// Dispatch a raw action and persist when it was applied.
    ///
    /// # Errors
    /// Returns an error if the action was refused or saving fails.
    pub fn dispatch(&mut self, action: Action) -> Result<Outcome> {
        self.apply(|store| {
            let outcome = store.dispatch(action);
            DispatchError::check(outcome.clone())?;
            Ok(outcome)
        })
    }

    /// Diff `edit` against the stored task and apply the resulting update.
    ///
    /// Returns `false` when the edit changes nothing; nothing is saved then.
    ///
    /// # Errors
    /// Returns an error if the task is missing, the edit is invalid or saving fails.
    pub fn edit_task(&mut self, id: &TaskId, edit: TaskEdit, offset: UtcOffset) -> Result<bool> {
        let state = self.store.state();
        let task = state
            .task(id)
            .ok_or_else(|| DispatchError::NotFound(EntityRef::Task(id.clone())))?;
        let update = edit.into_update(task, offset)?;
        if update.is_empty() {
            return Ok(false);
        }
        self.apply(|store| store.update_task(id, update))?;
        Ok(true)
    }

    /// Replace the whole state and persist it.
    ///
    /// # Errors
    /// Returns an error if saving fails.
    pub fn reset(&mut self, state: TaskState) -> Result<()> {
        self.store.replace(state);
        self.save()
    }

    /// Persist the current state.
    ///
    /// # Errors
    /// Returns an error if the backend cannot write.
    pub fn save(&self) -> Result<()> {
        self.backend
            .save(&self.store.state())
            .context("failed to save task state")
    }

    /// Filtered and sorted tasks, cloned out of the current state.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.store
            .state()
            .visible_tasks()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Dashboard statistics at the service clock's current time.
    #[must_use]
    pub fn stats(&self) -> TaskStats {
        self.store.state().stats(self.now())
    }

    /// Completion progress of one project.
    #[must_use]
    pub fn project_progress(&self, project: &ProjectId) -> ProjectProgress {
        self.store.state().project_progress(project)
    }

    /// Consume the service and hand back the backend.
    #[must_use]
    pub fn into_backend(self) -> S {
        self.backend
    }
}
