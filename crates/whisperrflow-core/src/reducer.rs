//! Task state and the pure action reducer.
//!
//! [`reduce`] never mutates its input: it clones the current [`TaskState`],
//! applies one [`Action`] to the clone and reports what happened through an
//! [`Outcome`]. Identifiers and the current time are supplied by the caller so
//! that every transition is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::filter::TaskFilter;
use crate::id::{CommentId, LabelId, ProjectId, SubtaskId, TaskId, UserId};
use crate::model::{
    Author, Comment, Label, LabelDraft, LabelUpdate, Project, ProjectDraft, ProjectUpdate,
    Subtask, SubtaskUpdate, Task, TaskDraft, TaskUpdate,
};
use crate::sort::TaskSort;
use crate::stats::{ProjectProgress, TaskStats};

/// The whole client-side state: entities plus view preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    /// Tasks in insertion order.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Projects in insertion order.
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Labels in insertion order.
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Task opened in the detail view.
    #[serde(default)]
    pub selected_task: Option<TaskId>,
    /// Project currently browsed.
    #[serde(default)]
    pub selected_project: Option<ProjectId>,
    /// Active filter.
    #[serde(default)]
    pub filter: TaskFilter,
    /// Active sort.
    #[serde(default)]
    pub sort: TaskSort,
    /// Global search box content.
    #[serde(default)]
    pub search_query: String,
}

impl TaskState {
    /// Empty workspace containing only the inbox project.
    #[must_use]
    pub fn new(owner_id: UserId, now: OffsetDateTime) -> Self {
        Self {
            tasks: Vec::new(),
            projects: vec![Project::inbox(owner_id, now)],
            labels: Vec::new(),
            selected_task: None,
            selected_project: None,
            filter: TaskFilter::default(),
            sort: TaskSort::default(),
            search_query: String::new(),
        }
    }

    /// Look up a task.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Look up a project.
    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| &project.id == id)
    }

    /// Look up a label.
    #[must_use]
    pub fn label(&self, id: &LabelId) -> Option<&Label> {
        self.labels.iter().find(|label| &label.id == id)
    }

    /// The selected task, if the selection still resolves.
    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_task.as_ref().and_then(|id| self.task(id))
    }

    /// The selected project, if the selection still resolves.
    #[must_use]
    pub fn selected_project(&self) -> Option<&Project> {
        self.selected_project.as_ref().and_then(|id| self.project(id))
    }

    /// The filter actually applied by [`Self::visible_tasks`]: a non-blank
    /// search query replaces the filter's own text.
    #[must_use]
    pub fn effective_filter(&self) -> TaskFilter {
        let query = self.search_query.trim();
        if query.is_empty() {
            self.filter.clone()
        } else {
            self.filter.with_text(Some(query))
        }
    }

    /// Filtered and sorted view of the tasks.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let filtered = self.effective_filter().apply(&self.tasks);
        self.sort.apply(filtered)
    }

    /// Non-archived tasks of one project, in insertion order.
    #[must_use]
    pub fn tasks_by_project(&self, project_id: &ProjectId) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| !task.archived && &task.project_id == project_id)
            .collect()
    }

    /// Dashboard statistics at `now`.
    #[must_use]
    pub fn stats(&self, now: OffsetDateTime) -> TaskStats {
        TaskStats::compute(&self.tasks, now)
    }

    /// Completion progress of one project.
    #[must_use]
    pub fn project_progress(&self, project_id: &ProjectId) -> ProjectProgress {
        ProjectProgress::compute(&self.tasks, project_id)
    }

    fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| &task.id == id)
    }

    fn next_task_position(&self) -> i64 {
        i64::try_from(self.tasks.len()).unwrap_or(i64::MAX)
    }
}

/// Every state transition the store accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a task built from `draft`.
    AddTask {
        /// Identifier chosen by the caller.
        id: TaskId,
        /// Task content.
        draft: TaskDraft,
    },
    /// Merge a partial update into a task.
    UpdateTask {
        /// Target task.
        id: TaskId,
        /// Fields to change.
        update: TaskUpdate,
    },
    /// Remove a task.
    DeleteTask(TaskId),
    /// Flip a task between `done` and `todo`.
    ToggleTaskCompletion(TaskId),
    /// Select a task, or clear the selection.
    SelectTask(Option<TaskId>),
    /// Append a project built from `draft`.
    AddProject {
        /// Identifier chosen by the caller.
        id: ProjectId,
        /// Project content.
        draft: ProjectDraft,
    },
    /// Merge a partial update into a project.
    UpdateProject {
        /// Target project.
        id: ProjectId,
        /// Fields to change.
        update: ProjectUpdate,
    },
    /// Remove a project, moving its tasks to the inbox.
    DeleteProject(ProjectId),
    /// Select a project, or clear the selection.
    SelectProject(Option<ProjectId>),
    /// Append a label.
    AddLabel {
        /// Identifier chosen by the caller.
        id: LabelId,
        /// Label content.
        draft: LabelDraft,
    },
    /// Merge a partial update into a label.
    UpdateLabel {
        /// Target label.
        id: LabelId,
        /// Fields to change.
        update: LabelUpdate,
    },
    /// Remove a label and detach it from every task.
    DeleteLabel(LabelId),
    /// Replace the active filter.
    SetFilter(TaskFilter),
    /// Replace the active sort.
    SetSort(TaskSort),
    /// Replace the search query.
    SetSearchQuery(String),
    /// Append a subtask to a task.
    AddSubtask {
        /// Owning task.
        task: TaskId,
        /// Identifier chosen by the caller.
        id: SubtaskId,
        /// Subtask title.
        title: String,
    },
    /// Merge a partial update into a subtask.
    UpdateSubtask {
        /// Owning task.
        task: TaskId,
        /// Target subtask.
        subtask: SubtaskId,
        /// Fields to change.
        update: SubtaskUpdate,
    },
    /// Flip a subtask's completion flag.
    ToggleSubtask {
        /// Owning task.
        task: TaskId,
        /// Target subtask.
        subtask: SubtaskId,
    },
    /// Remove a subtask.
    DeleteSubtask {
        /// Owning task.
        task: TaskId,
        /// Target subtask.
        subtask: SubtaskId,
    },
    /// Append a comment to a task.
    AddComment {
        /// Target task.
        task: TaskId,
        /// Identifier chosen by the caller.
        id: CommentId,
        /// Who wrote it.
        author: Author,
        /// Body text.
        content: String,
    },
    /// Assign positions from the order of the given ids.
    ReorderTasks(Vec<TaskId>),
}

impl Action {
    /// Short machine-readable name, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddTask { .. } => "add_task",
            Self::UpdateTask { .. } => "update_task",
            Self::DeleteTask(_) => "delete_task",
            Self::ToggleTaskCompletion(_) => "toggle_task_completion",
            Self::SelectTask(_) => "select_task",
            Self::AddProject { .. } => "add_project",
            Self::UpdateProject { .. } => "update_project",
            Self::DeleteProject(_) => "delete_project",
            Self::SelectProject(_) => "select_project",
            Self::AddLabel { .. } => "add_label",
            Self::UpdateLabel { .. } => "update_label",
            Self::DeleteLabel(_) => "delete_label",
            Self::SetFilter(_) => "set_filter",
            Self::SetSort(_) => "set_sort",
            Self::SetSearchQuery(_) => "set_search_query",
            Self::AddSubtask { .. } => "add_subtask",
            Self::UpdateSubtask { .. } => "update_subtask",
            Self::ToggleSubtask { .. } => "toggle_subtask",
            Self::DeleteSubtask { .. } => "delete_subtask",
            Self::AddComment { .. } => "add_comment",
            Self::ReorderTasks(_) => "reorder_tasks",
        }
    }
}

/// Entity an action referred to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// A task.
    Task(TaskId),
    /// A project.
    Project(ProjectId),
    /// A label.
    Label(LabelId),
    /// A subtask inside a task.
    Subtask {
        /// Owning task.
        task: TaskId,
        /// Subtask id.
        subtask: SubtaskId,
    },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(id) => write!(f, "task {id}"),
            Self::Project(id) => write!(f, "project {id}"),
            Self::Label(id) => write!(f, "label {id}"),
            Self::Subtask { task, subtask } => write!(f, "subtask {subtask} of task {task}"),
        }
    }
}

/// What the reducer did with an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The action took effect.
    Applied,
    /// The referenced entity does not exist; state is unchanged.
    NotFound(EntityRef),
    /// The referenced entity may not be changed this way; state is unchanged.
    Protected(EntityRef),
}

impl Outcome {
    /// Whether the action took effect.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Protected(entity) => write!(f, "{entity} is protected"),
        }
    }
}

/// Result of [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    /// The next state.
    pub state: TaskState,
    /// What happened.
    pub outcome: Outcome,
}

/// Apply `action` to a copy of `state`.
#[must_use]
pub fn reduce(state: &TaskState, action: Action, now: OffsetDateTime) -> Reduction {
    let mut next = state.clone();
    let outcome = apply(&mut next, action, now);
    let state = if outcome.is_applied() {
        next
    } else {
        state.clone()
    };
    Reduction { state, outcome }
}

#[allow(clippy::too_many_lines)]
fn apply(state: &mut TaskState, action: Action, now: OffsetDateTime) -> Outcome {
    match action {
        Action::AddTask { id, draft } => {
            let position = state.next_task_position();
            state.tasks.push(Task::from_draft(id, draft, now, position));
            Outcome::Applied
        }
        Action::UpdateTask { id, update } => with_task(state, id, |task| {
            task.apply_update(update, now);
        }),
        Action::DeleteTask(id) => {
            let before = state.tasks.len();
            state.tasks.retain(|task| task.id != id);
            if state.tasks.len() == before {
                return Outcome::NotFound(EntityRef::Task(id));
            }
            if state.selected_task.as_ref() == Some(&id) {
                state.selected_task = None;
            }
            Outcome::Applied
        }
        Action::ToggleTaskCompletion(id) => with_task(state, id, |task| {
            task.toggle_completion(now);
        }),
        Action::SelectTask(selection) => {
            if let Some(id) = &selection
                && state.task(id).is_none()
            {
                return Outcome::NotFound(EntityRef::Task(id.clone()));
            }
            state.selected_task = selection;
            Outcome::Applied
        }
        Action::AddProject { id, draft } => {
            let position = i64::try_from(state.projects.len()).unwrap_or(i64::MAX);
            state
                .projects
                .push(Project::from_draft(id, draft, now, position));
            Outcome::Applied
        }
        Action::UpdateProject { id, update } => {
            match state.projects.iter_mut().find(|project| project.id == id) {
                Some(project) => {
                    project.apply_update(update, now);
                    Outcome::Applied
                }
                None => Outcome::NotFound(EntityRef::Project(id)),
            }
        }
        Action::DeleteProject(id) => delete_project(state, id, now),
        Action::SelectProject(selection) => {
            if let Some(id) = &selection
                && state.project(id).is_none()
            {
                return Outcome::NotFound(EntityRef::Project(id.clone()));
            }
            state.selected_project = selection;
            Outcome::Applied
        }
        Action::AddLabel { id, draft } => {
            let LabelDraft {
                name,
                color,
                description,
            } = draft;
            state.labels.push(Label {
                id,
                name,
                color,
                description,
            });
            Outcome::Applied
        }
        Action::UpdateLabel { id, update } => {
            match state.labels.iter_mut().find(|label| label.id == id) {
                Some(label) => {
                    label.apply_update(update);
                    Outcome::Applied
                }
                None => Outcome::NotFound(EntityRef::Label(id)),
            }
        }
        Action::DeleteLabel(id) => delete_label(state, id, now),
        Action::SetFilter(filter) => {
            state.filter = filter;
            Outcome::Applied
        }
        Action::SetSort(sort) => {
            state.sort = sort;
            Outcome::Applied
        }
        Action::SetSearchQuery(query) => {
            state.search_query = query;
            Outcome::Applied
        }
        Action::AddSubtask { task, id, title } => with_task(state, task, |task| {
            task.subtasks.push(Subtask {
                id,
                title,
                completed: false,
                created_at: now,
                completed_at: None,
            });
            task.updated_at = now;
        }),
        Action::UpdateSubtask {
            task,
            subtask,
            update,
        } => with_subtask(state, task, subtask, now, |subtask| {
            update.apply_to(subtask, now);
        }),
        Action::ToggleSubtask { task, subtask } => {
            with_subtask(state, task, subtask, now, |subtask| subtask.toggle(now))
        }
        Action::DeleteSubtask { task, subtask } => {
            let Some(target) = state.task_mut(&task) else {
                return Outcome::NotFound(EntityRef::Task(task));
            };
            let before = target.subtasks.len();
            target.subtasks.retain(|entry| entry.id != subtask);
            if target.subtasks.len() == before {
                return Outcome::NotFound(EntityRef::Subtask { task, subtask });
            }
            target.updated_at = now;
            Outcome::Applied
        }
        Action::AddComment {
            task,
            id,
            author,
            content,
        } => with_task(state, task, |task| {
            task.comments.push(Comment {
                id,
                content,
                author,
                created_at: now,
            });
            task.updated_at = now;
        }),
        Action::ReorderTasks(order) => {
            reorder_tasks(state, &order, now);
            Outcome::Applied
        }
    }
}

fn with_task(state: &mut TaskState, id: TaskId, mutate: impl FnOnce(&mut Task)) -> Outcome {
    match state.task_mut(&id) {
        Some(task) => {
            mutate(task);
            Outcome::Applied
        }
        None => Outcome::NotFound(EntityRef::Task(id)),
    }
}

fn with_subtask(
    state: &mut TaskState,
    task: TaskId,
    subtask: SubtaskId,
    now: OffsetDateTime,
    mutate: impl FnOnce(&mut Subtask),
) -> Outcome {
    let Some(target) = state.task_mut(&task) else {
        return Outcome::NotFound(EntityRef::Task(task));
    };
    let Some(entry) = target.subtask_mut(&subtask) else {
        return Outcome::NotFound(EntityRef::Subtask { task, subtask });
    };
    mutate(entry);
    target.updated_at = now;
    Outcome::Applied
}

fn delete_project(state: &mut TaskState, id: ProjectId, now: OffsetDateTime) -> Outcome {
    if id.is_inbox() {
        return Outcome::Protected(EntityRef::Project(id));
    }
    let before = state.projects.len();
    state.projects.retain(|project| project.id != id);
    if state.projects.len() == before {
        return Outcome::NotFound(EntityRef::Project(id));
    }

    for task in state.tasks.iter_mut().filter(|task| task.project_id == id) {
        task.project_id = ProjectId::inbox();
        task.updated_at = now;
    }
    if state.selected_project.as_ref() == Some(&id) {
        state.selected_project = None;
    }
    if state.filter.project.as_ref() == Some(&id) {
        state.filter.project = None;
    }
    Outcome::Applied
}

fn delete_label(state: &mut TaskState, id: LabelId, now: OffsetDateTime) -> Outcome {
    let before = state.labels.len();
    state.labels.retain(|label| label.id != id);
    if state.labels.len() == before {
        return Outcome::NotFound(EntityRef::Label(id));
    }

    for task in &mut state.tasks {
        if task.labels.remove(&id) {
            task.updated_at = now;
        }
    }
    state.filter.labels.remove(&id);
    Outcome::Applied
}

fn reorder_tasks(state: &mut TaskState, order: &[TaskId], now: OffsetDateTime) {
    let mut positions: BTreeMap<&TaskId, i64> = BTreeMap::new();
    for (index, id) in order.iter().enumerate() {
        positions
            .entry(id)
            .or_insert_with(|| i64::try_from(index).unwrap_or(i64::MAX));
    }

    for task in &mut state.tasks {
        if let Some(&position) = positions.get(&task.id)
            && task.position != position
        {
            task.position = position;
            task.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TaskFilterBuilder;
    use crate::state::{Priority, TaskStatus};
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2025-05-01 09:00 UTC);
    const T1: OffsetDateTime = datetime!(2025-05-01 10:00 UTC);

    fn parse<T: std::str::FromStr>(raw: &str) -> T
    where
        T::Err: fmt::Display,
    {
        raw.parse().unwrap_or_else(|err| panic!("parse {raw}: {err}"))
    }

    fn owner() -> UserId {
        parse("user-1")
    }

    fn dispatch(state: &TaskState, action: Action, now: OffsetDateTime) -> TaskState {
        let Reduction { state, outcome } = reduce(state, action, now);
        assert_eq!(outcome, Outcome::Applied);
        state
    }

    fn single_task(title: &str, project: &str) -> (TaskState, TaskId) {
        let state = TaskState::new(owner(), T0);
        let id: TaskId = parse("task-1");
        let draft = TaskDraft::new(title, parse(project), owner());
        let state = dispatch(
            &state,
            Action::AddTask {
                id: id.clone(),
                draft,
            },
            T0,
        );
        (state, id)
    }

    fn add_project(state: &TaskState, id: &str) -> TaskState {
        dispatch(
            state,
            Action::AddProject {
                id: parse(id),
                draft: ProjectDraft {
                    name: id.to_owned(),
                    description: None,
                    color: "#3b82f6".into(),
                    icon: None,
                    owner_id: owner(),
                    member_ids: Vec::new(),
                    favorite: false,
                    settings: crate::model::ProjectSettings::default(),
                },
            },
            T0,
        )
    }

    #[test]
    fn new_state_contains_only_inbox() {
        let state = TaskState::new(owner(), T0);
        assert_eq!(state.projects.len(), 1);
        assert!(state.projects[0].id.is_inbox());
        assert!(state.tasks.is_empty());
        assert_eq!(state.sort, TaskSort::default());
        assert!(state.filter.show_completed);
    }

    #[test]
    fn add_task_stamps_times_and_position() {
        let (state, id) = single_task("Write report", "inbox");
        let second = dispatch(
            &state,
            Action::AddTask {
                id: parse("task-2"),
                draft: TaskDraft::new("Review", ProjectId::inbox(), owner()),
            },
            T1,
        );
        let first = second.task(&id).unwrap_or_else(|| panic!("task-1 must exist"));
        assert_eq!(first.position, 0);
        assert_eq!(first.created_at, T0);
        let added = second
            .task(&parse("task-2"))
            .unwrap_or_else(|| panic!("task-2 must exist"));
        assert_eq!(added.position, 1);
        assert_eq!(added.created_at, T1);
        assert_eq!(added.updated_at, T1);
    }

    #[test]
    fn reducer_leaves_input_untouched() {
        let (state, id) = single_task("Write report", "inbox");
        let before = state.clone();
        let next = dispatch(&state, Action::ToggleTaskCompletion(id), T1);
        assert_eq!(state, before);
        assert_ne!(next, before);
    }

    #[test]
    fn update_task_merges_fields_and_restamps() {
        let (state, id) = single_task("Write report", "inbox");
        let next = dispatch(
            &state,
            Action::UpdateTask {
                id: id.clone(),
                update: TaskUpdate {
                    title: Some("Write final report".into()),
                    priority: Some(Priority::High),
                    ..TaskUpdate::default()
                },
            },
            T1,
        );
        let task = next.task(&id).unwrap_or_else(|| panic!("task must exist"));
        assert_eq!(task.title, "Write final report");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.updated_at, T1);
        assert_eq!(task.created_at, T0);
    }

    #[test]
    fn unknown_ids_report_not_found_and_keep_state() {
        let (state, _) = single_task("Write report", "inbox");
        let missing: TaskId = parse("task-404");
        let cases = vec![
            Action::UpdateTask {
                id: missing.clone(),
                update: TaskUpdate::default(),
            },
            Action::DeleteTask(missing.clone()),
            Action::ToggleTaskCompletion(missing.clone()),
            Action::SelectTask(Some(missing.clone())),
            Action::AddSubtask {
                task: missing.clone(),
                id: parse("sub-1"),
                title: "x".into(),
            },
        ];
        for action in cases {
            let kind = action.kind();
            let Reduction { state: next, outcome } = reduce(&state, action, T1);
            assert_eq!(
                outcome,
                Outcome::NotFound(EntityRef::Task(missing.clone())),
                "{kind}"
            );
            assert_eq!(next, state, "{kind}");
        }

        let Reduction { outcome, .. } = reduce(&state, Action::DeleteLabel(parse("label-x")), T1);
        assert_eq!(outcome, Outcome::NotFound(EntityRef::Label(parse("label-x"))));
    }

    #[test]
    fn delete_task_clears_selection() {
        let (state, id) = single_task("Write report", "inbox");
        let selected = dispatch(&state, Action::SelectTask(Some(id.clone())), T0);
        assert_eq!(selected.selected_task().map(|task| &task.id), Some(&id));

        let deleted = dispatch(&selected, Action::DeleteTask(id), T1);
        assert!(deleted.tasks.is_empty());
        assert!(deleted.selected_task.is_none());
    }

    #[test]
    fn toggle_completion_round_trip() {
        let (state, id) = single_task("Write report", "inbox");
        let done = dispatch(&state, Action::ToggleTaskCompletion(id.clone()), T1);
        let task = done.task(&id).unwrap_or_else(|| panic!("task must exist"));
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, Some(T1));

        let reopened = dispatch(&done, Action::ToggleTaskCompletion(id.clone()), T1);
        let task = reopened.task(&id).unwrap_or_else(|| panic!("task must exist"));
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn deleting_project_moves_tasks_to_inbox() {
        let state = add_project(&TaskState::new(owner(), T0), "project-1");
        let state = dispatch(
            &state,
            Action::AddTask {
                id: parse("task-1"),
                draft: TaskDraft::new("Plan", parse("project-1"), owner()),
            },
            T0,
        );
        let state = dispatch(&state, Action::SelectProject(Some(parse("project-1"))), T0);

        let next = dispatch(&state, Action::DeleteProject(parse("project-1")), T1);
        assert_eq!(next.tasks.len(), 1);
        assert!(next.tasks[0].project_id.is_inbox());
        assert_eq!(next.tasks[0].updated_at, T1);
        assert!(next.selected_project.is_none());
        assert!(next.project(&parse("project-1")).is_none());
    }

    #[test]
    fn inbox_cannot_be_deleted() {
        let state = TaskState::new(owner(), T0);
        let Reduction { state: next, outcome } =
            reduce(&state, Action::DeleteProject(ProjectId::inbox()), T1);
        assert_eq!(outcome, Outcome::Protected(EntityRef::Project(ProjectId::inbox())));
        assert_eq!(next, state);
    }

    #[test]
    fn deleting_label_detaches_without_deleting_tasks() {
        let state = dispatch(
            &TaskState::new(owner(), T0),
            Action::AddLabel {
                id: parse("label-1"),
                draft: LabelDraft {
                    name: "Bug".into(),
                    color: "#ef4444".into(),
                    description: None,
                },
            },
            T0,
        );
        let mut draft = TaskDraft::new("Fix login", ProjectId::inbox(), owner());
        draft.labels.insert(parse("label-1"));
        draft.labels.insert(parse("label-2"));
        let state = dispatch(
            &state,
            Action::AddTask {
                id: parse("task-1"),
                draft,
            },
            T0,
        );
        let state = dispatch(
            &state,
            Action::AddTask {
                id: parse("task-2"),
                draft: TaskDraft::new("Untagged", ProjectId::inbox(), owner()),
            },
            T0,
        );
        let state = dispatch(
            &state,
            Action::SetFilter(TaskFilterBuilder::new().labels([parse("label-1")]).build()),
            T0,
        );

        let next = dispatch(&state, Action::DeleteLabel(parse("label-1")), T1);
        assert_eq!(next.tasks.len(), 2);
        assert!(next.labels.is_empty());
        let tagged = &next.tasks[0];
        assert_eq!(tagged.labels.len(), 1);
        assert!(tagged.labels.contains(&parse("label-2")));
        assert_eq!(tagged.updated_at, T1);
        assert_eq!(next.tasks[1].updated_at, T0);
        assert!(next.filter.labels.is_empty());
    }

    #[test]
    fn project_and_label_updates() {
        let state = add_project(&TaskState::new(owner(), T0), "project-1");
        let state = dispatch(
            &state,
            Action::UpdateProject {
                id: parse("project-1"),
                update: ProjectUpdate {
                    name: Some("Launch".into()),
                    favorite: Some(true),
                    ..ProjectUpdate::default()
                },
            },
            T1,
        );
        let project = state
            .project(&parse("project-1"))
            .unwrap_or_else(|| panic!("project must exist"));
        assert_eq!(project.name, "Launch");
        assert!(project.favorite);
        assert_eq!(project.updated_at, T1);
        assert_eq!(project.position, 1);

        let Reduction { outcome, .. } = reduce(
            &state,
            Action::UpdateLabel {
                id: parse("label-9"),
                update: LabelUpdate::default(),
            },
            T1,
        );
        assert_eq!(outcome, Outcome::NotFound(EntityRef::Label(parse("label-9"))));
    }

    #[test]
    fn subtask_lifecycle_restamps_task() {
        let (state, id) = single_task("Design", "inbox");
        let sub: SubtaskId = parse("sub-1");
        let state = dispatch(
            &state,
            Action::AddSubtask {
                task: id.clone(),
                id: sub.clone(),
                title: "Wireframes".into(),
            },
            T0,
        );
        let toggled = dispatch(
            &state,
            Action::ToggleSubtask {
                task: id.clone(),
                subtask: sub.clone(),
            },
            T1,
        );
        let task = toggled.task(&id).unwrap_or_else(|| panic!("task must exist"));
        let subtask = task.subtask(&sub).unwrap_or_else(|| panic!("subtask must exist"));
        assert!(subtask.completed);
        assert_eq!(subtask.completed_at, Some(T1));
        assert_eq!(task.updated_at, T1);
        assert_eq!(task.subtask_progress(), (1, 1));

        let renamed = dispatch(
            &toggled,
            Action::UpdateSubtask {
                task: id.clone(),
                subtask: sub.clone(),
                update: SubtaskUpdate {
                    title: Some("Mockups".into()),
                    completed: None,
                },
            },
            T1,
        );
        let task = renamed.task(&id).unwrap_or_else(|| panic!("task must exist"));
        assert_eq!(task.subtasks[0].title, "Mockups");

        let removed = dispatch(
            &renamed,
            Action::DeleteSubtask {
                task: id.clone(),
                subtask: sub.clone(),
            },
            T1,
        );
        let task = removed.task(&id).unwrap_or_else(|| panic!("task must exist"));
        assert!(task.subtasks.is_empty());

        let Reduction { outcome, .. } = reduce(
            &removed,
            Action::ToggleSubtask {
                task: id.clone(),
                subtask: sub.clone(),
            },
            T1,
        );
        assert_eq!(outcome, Outcome::NotFound(EntityRef::Subtask { task: id, subtask: sub }));
    }

    #[test]
    fn comments_carry_supplied_author() {
        let (state, id) = single_task("Design", "inbox");
        let author = Author {
            id: parse("user-2"),
            name: "Sam".into(),
        };
        let next = dispatch(
            &state,
            Action::AddComment {
                task: id.clone(),
                id: parse("comment-1"),
                author: author.clone(),
                content: "Looks good".into(),
            },
            T1,
        );
        let task = next.task(&id).unwrap_or_else(|| panic!("task must exist"));
        assert_eq!(task.comments.len(), 1);
        assert_eq!(task.comments[0].author, author);
        assert_eq!(task.comments[0].created_at, T1);
        assert_eq!(task.updated_at, T1);
    }

    #[test]
    fn reorder_uses_list_index_and_ignores_unknown_ids() {
        let mut state = TaskState::new(owner(), T0);
        for raw in ["task-a", "task-b", "task-c"] {
            state = dispatch(
                &state,
                Action::AddTask {
                    id: parse(raw),
                    draft: TaskDraft::new(raw, ProjectId::inbox(), owner()),
                },
                T0,
            );
        }
        let next = dispatch(
            &state,
            Action::ReorderTasks(vec![parse("task-c"), parse("ghost"), parse("task-a")]),
            T1,
        );
        let positions: Vec<(String, i64)> = next
            .tasks
            .iter()
            .map(|task| (task.id.to_string(), task.position))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("task-a".to_owned(), 2),
                ("task-b".to_owned(), 1),
                ("task-c".to_owned(), 0),
            ]
        );
        // task-b kept its position and is not re-stamped.
        assert_eq!(next.tasks[1].updated_at, T0);
        assert_eq!(next.tasks[0].updated_at, T1);
    }

    #[test]
    fn search_query_overrides_filter_text() {
        let mut state = TaskState::new(owner(), T0);
        for (raw, title) in [("task-a", "Buy milk"), ("task-b", "Book flights")] {
            state = dispatch(
                &state,
                Action::AddTask {
                    id: parse(raw),
                    draft: TaskDraft::new(title, ProjectId::inbox(), owner()),
                },
                T0,
            );
        }
        let state = dispatch(
            &state,
            Action::SetFilter(TaskFilterBuilder::new().text("milk").build()),
            T0,
        );
        assert_eq!(state.visible_tasks().len(), 1);

        let searched = dispatch(&state, Action::SetSearchQuery("  flights ".into()), T0);
        let visible = searched.visible_tasks();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Book flights");

        let blank = dispatch(&searched, Action::SetSearchQuery("   ".into()), T0);
        assert_eq!(blank.visible_tasks()[0].title, "Buy milk");
    }

    #[test]
    fn state_round_trips_through_json() {
        let (state, _) = single_task("Write report", "inbox");
        let json = serde_json::to_string(&state).unwrap_or_else(|err| panic!("serialize: {err}"));
        let back: TaskState =
            serde_json::from_str(&json).unwrap_or_else(|err| panic!("deserialize: {err}"));
        assert_eq!(back, state);
    }
}
