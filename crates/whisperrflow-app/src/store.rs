//! Observable task store.
//!
//! The [`Store`] owns the current [`TaskState`] and applies actions through
//! the core reducer, strictly in call order. Every new state is published on a
//! `tokio::sync::watch` channel; subscribers always see the latest state and
//! publishing never requires a runtime.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};
use whisperrflow_core::{
    Action, Author, CommentId, EntityRef, LabelDraft, LabelId, LabelUpdate, Outcome, ProjectDraft,
    ProjectId, ProjectUpdate, Reduction, SubtaskId, SubtaskUpdate, TaskDraft, TaskFilter, TaskId,
    TaskSort, TaskState, TaskUpdate, reduce,
};

use crate::clock::{Clock, SystemClock};

/// Error raised by the store's action creators when the reducer refuses an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(EntityRef),
    /// The referenced entity cannot be changed this way.
    #[error("{0} cannot be modified")]
    Protected(EntityRef),
}

impl DispatchError {
    /// Convert a reducer outcome into a result.
    ///
    /// # Errors
    /// Returns the matching variant for `NotFound` and `Protected` outcomes.
    pub fn check(outcome: Outcome) -> Result<(), Self> {
        match outcome {
            Outcome::Applied => Ok(()),
            Outcome::NotFound(entity) => Err(Self::NotFound(entity)),
            Outcome::Protected(entity) => Err(Self::Protected(entity)),
        }
    }
}

/// Result alias for action creators.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Single source of truth for the task state.
pub struct Store {
    sender: watch::Sender<Arc<TaskState>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("tasks", &self.sender.borrow().tasks.len())
            .field("subscribers", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Wrap `state`, reading time from the system clock.
    #[must_use]
    pub fn new(state: TaskState) -> Self {
        Self::with_clock(state, Arc::new(SystemClock))
    }

    /// Wrap `state` with an explicit clock.
    #[must_use]
    pub fn with_clock(state: TaskState, clock: Arc<dyn Clock>) -> Self {
        let (sender, _) = watch::channel(Arc::new(state));
        Self { sender, clock }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> Arc<TaskState> {
        Arc::clone(&self.sender.borrow())
    }

    /// Current time according to the store's clock.
    #[must_use]
    pub fn now(&self) -> time::OffsetDateTime {
        self.clock.now()
    }

    /// Receive every state published after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<TaskState>> {
        self.sender.subscribe()
    }

    /// Apply one action and publish the resulting state.
    ///
    /// Refused actions (`NotFound`, `Protected`) leave the state unchanged and
    /// publish nothing.
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        let kind = action.kind();
        let now = self.clock.now();
        let Reduction { state, outcome } = reduce(&self.state(), action, now);

        if outcome.is_applied() {
            debug!(action = kind, tasks = state.tasks.len(), "dispatched action");
            self.sender.send_replace(Arc::new(state));
        } else {
            warn!(action = kind, %outcome, "action refused");
        }
        outcome
    }

    /// Swap in an entirely new state, e.g. a freshly seeded workspace.
    pub fn replace(&mut self, state: TaskState) {
        debug!(tasks = state.tasks.len(), "replaced state");
        self.sender.send_replace(Arc::new(state));
    }

    fn dispatch_checked(&mut self, action: Action) -> DispatchResult<()> {
        DispatchError::check(self.dispatch(action))
    }

    /// Create a task and return its fresh identifier.
    pub fn add_task(&mut self, draft: TaskDraft) -> TaskId {
        let id = TaskId::new();
        self.dispatch(Action::AddTask {
            id: id.clone(),
            draft,
        });
        id
    }

    /// Merge a partial update into a task.
    ///
    /// # Errors
    /// Fails when the task does not exist.
    pub fn update_task(&mut self, id: &TaskId, update: TaskUpdate) -> DispatchResult<()> {
        self.dispatch_checked(Action::UpdateTask {
            id: id.clone(),
            update,
        })
    }

    /// Delete a task.
    ///
    /// # Errors
    /// Fails when the task does not exist.
    pub fn delete_task(&mut self, id: &TaskId) -> DispatchResult<()> {
        self.dispatch_checked(Action::DeleteTask(id.clone()))
    }

    /// Flip a task between done and todo.
    ///
    /// # Errors
    /// Fails when the task does not exist.
    pub fn toggle_task_completion(&mut self, id: &TaskId) -> DispatchResult<()> {
        self.dispatch_checked(Action::ToggleTaskCompletion(id.clone()))
    }

    /// Select a task or clear the selection.
    ///
    /// # Errors
    /// Fails when the task does not exist.
    pub fn select_task(&mut self, id: Option<&TaskId>) -> DispatchResult<()> {
        self.dispatch_checked(Action::SelectTask(id.cloned()))
    }

    /// Create a project and return its fresh identifier.
    pub fn add_project(&mut self, draft: ProjectDraft) -> ProjectId {
        let id = ProjectId::new();
        self.dispatch(Action::AddProject {
            id: id.clone(),
            draft,
        });
        id
    }

    /// Merge a partial update into a project.
    ///
    /// # Errors
    /// Fails when the project does not exist.
    pub fn update_project(&mut self, id: &ProjectId, update: ProjectUpdate) -> DispatchResult<()> {
        self.dispatch_checked(Action::UpdateProject {
            id: id.clone(),
            update,
        })
    }

    /// Delete a project, moving its tasks to the inbox.
    ///
    /// # Errors
    /// Fails when the project does not exist or is the inbox.
    pub fn delete_project(&mut self, id: &ProjectId) -> DispatchResult<()> {
        self.dispatch_checked(Action::DeleteProject(id.clone()))
    }

    /// Select a project or clear the selection.
    ///
    /// # Errors
    /// Fails when the project does not exist.
    pub fn select_project(&mut self, id: Option<&ProjectId>) -> DispatchResult<()> {
        self.dispatch_checked(Action::SelectProject(id.cloned()))
    }

    /// Create a label and return its fresh identifier.
    pub fn add_label(&mut self, draft: LabelDraft) -> LabelId {
        let id = LabelId::new();
        self.dispatch(Action::AddLabel {
            id: id.clone(),
            draft,
        });
        id
    }

    /// Merge a partial update into a label.
    ///
    /// # Errors
    /// Fails when the label does not exist.
    pub fn update_label(&mut self, id: &LabelId, update: LabelUpdate) -> DispatchResult<()> {
        self.dispatch_checked(Action::UpdateLabel {
            id: id.clone(),
            update,
        })
    }

    /// Delete a label and detach it from every task.
    ///
    /// # Errors
    /// Fails when the label does not exist.
    pub fn delete_label(&mut self, id: &LabelId) -> DispatchResult<()> {
        self.dispatch_checked(Action::DeleteLabel(id.clone()))
    }

    /// Replace the active filter.
    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.dispatch(Action::SetFilter(filter));
    }

    /// Replace the active sort.
    pub fn set_sort(&mut self, sort: TaskSort) {
        self.dispatch(Action::SetSort(sort));
    }

    /// Replace the search query.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.dispatch(Action::SetSearchQuery(query.into()));
    }

    /// Append a subtask and return its fresh identifier.
    ///
    /// # Errors
    /// Fails when the task does not exist.
    pub fn add_subtask(&mut self, task: &TaskId, title: impl Into<String>) -> DispatchResult<SubtaskId> {
        let id = SubtaskId::new();
        self.dispatch_checked(Action::AddSubtask {
            task: task.clone(),
            id: id.clone(),
            title: title.into(),
        })?;
        Ok(id)
    }

    /// Merge a partial update into a subtask.
    ///
    /// # Errors
    /// Fails when the task or subtask does not exist.
    pub fn update_subtask(
        &mut self,
        task: &TaskId,
        subtask: &SubtaskId,
        update: SubtaskUpdate,
    ) -> DispatchResult<()> {
        self.dispatch_checked(Action::UpdateSubtask {
            task: task.clone(),
            subtask: subtask.clone(),
            update,
        })
    }

    /// Flip a subtask's completion flag.
    ///
    /// # Errors
    /// Fails when the task or subtask does not exist.
    pub fn toggle_subtask(&mut self, task: &TaskId, subtask: &SubtaskId) -> DispatchResult<()> {
        self.dispatch_checked(Action::ToggleSubtask {
            task: task.clone(),
            subtask: subtask.clone(),
        })
    }

    /// Remove a subtask.
    ///
    /// # Errors
    /// Fails when the task or subtask does not exist.
    pub fn delete_subtask(&mut self, task: &TaskId, subtask: &SubtaskId) -> DispatchResult<()> {
        self.dispatch_checked(Action::DeleteSubtask {
            task: task.clone(),
            subtask: subtask.clone(),
        })
    }

    /// Append a comment and return its fresh identifier.
    ///
    /// # Errors
    /// Fails when the task does not exist.
    pub fn add_comment(
        &mut self,
        task: &TaskId,
        author: Author,
        content: impl Into<String>,
    ) -> DispatchResult<CommentId> {
        let id = CommentId::new();
        self.dispatch_checked(Action::AddComment {
            task: task.clone(),
            id: id.clone(),
            author,
            content: content.into(),
        })?;
        Ok(id)
    }

    /// Assign positions from the order of `ids`; unknown ids are ignored.
    pub fn reorder_tasks(&mut self, ids: Vec<TaskId>) {
        self.dispatch(Action::ReorderTasks(ids));
    }
}
