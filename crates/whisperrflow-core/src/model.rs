use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::{AttachmentId, CommentId, LabelId, ProjectId, SubtaskId, TaskId, UserId};
use crate::state::{Priority, TaskStatus};

/// Author context attached to comments. Supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Author identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
}

/// Checklist entry nested inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Identifier, unique within the owning task.
    pub id: SubtaskId,
    /// Short description.
    pub title: String,
    /// Completion flag.
    pub completed: bool,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Time the subtask was last checked off.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl Subtask {
    /// Flip the completion flag, stamping or clearing `completed_at`.
    pub fn toggle(&mut self, now: OffsetDateTime) {
        self.set_completed(!self.completed, now);
    }

    fn set_completed(&mut self, completed: bool, now: OffsetDateTime) {
        if completed == self.completed {
            return;
        }
        self.completed = completed;
        self.completed_at = completed.then_some(now);
    }
}

/// Partial update for a subtask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtaskUpdate {
    /// New title.
    pub title: Option<String>,
    /// New completion flag.
    pub completed: Option<bool>,
}

/// Comment left on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: CommentId,
    /// Body text.
    pub content: String,
    /// Who wrote it.
    pub author: Author,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Workflow status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: Priority,
    /// Owning project (`inbox` when ungrouped).
    pub project_id: ProjectId,
    /// Attached labels.
    #[serde(default)]
    pub labels: BTreeSet<LabelId>,
    /// Ordered checklist.
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Ordered comments.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Attachment references.
    #[serde(default)]
    pub attachments: Vec<AttachmentId>,
    /// Assigned users.
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
    /// Creator.
    pub creator_id: UserId,
    /// Optional deadline.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    /// Optional start.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    /// Estimated effort in minutes.
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last mutation time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Set only while `status` is done.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    /// Soft-delete flag.
    #[serde(default)]
    pub archived: bool,
    /// Manual ordering hint.
    #[serde(default)]
    pub position: i64,
}

impl Task {
    /// Materialize a draft into a task with both timestamps set to `now`.
    #[must_use]
    pub fn from_draft(id: TaskId, draft: TaskDraft, now: OffsetDateTime, position: i64) -> Self {
        let TaskDraft {
            title,
            description,
            status,
            priority,
            project_id,
            labels,
            attachments,
            assignee_ids,
            creator_id,
            due_date,
            start_date,
            estimated_minutes,
            archived,
        } = draft;

        Self {
            id,
            title,
            description,
            status,
            priority,
            project_id,
            labels,
            subtasks: Vec::new(),
            comments: Vec::new(),
            attachments,
            assignee_ids,
            creator_id,
            due_date,
            start_date,
            estimated_minutes,
            created_at: now,
            updated_at: now,
            completed_at: status.is_done().then_some(now),
            archived,
            position,
        }
    }

    /// Whether the task is completed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// Flip between `done` and `todo`.
    ///
    /// Any status other than `done` moves to `done`, so a blocked or
    /// in-progress task loses its previous status.
    pub fn toggle_completion(&mut self, now: OffsetDateTime) {
        if self.is_done() {
            self.status = TaskStatus::Todo;
            self.completed_at = None;
        } else {
            self.status = TaskStatus::Done;
            self.completed_at = Some(now);
        }
        self.updated_at = now;
    }

    /// Merge the populated fields of `update` and re-stamp `updated_at`.
    pub fn apply_update(&mut self, update: TaskUpdate, now: OffsetDateTime) {
        let TaskUpdate {
            title,
            description,
            status,
            priority,
            project_id,
            labels,
            assignee_ids,
            due_date,
            start_date,
            estimated_minutes,
            archived,
            position,
        } = update;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(status) = status {
            self.set_status(status, now);
        }
        if let Some(priority) = priority {
            self.priority = priority;
        }
        if let Some(project_id) = project_id {
            self.project_id = project_id;
        }
        if let Some(labels) = labels {
            self.labels = labels;
        }
        if let Some(assignee_ids) = assignee_ids {
            self.assignee_ids = assignee_ids;
        }
        if let Some(due_date) = due_date {
            self.due_date = due_date;
        }
        if let Some(start_date) = start_date {
            self.start_date = start_date;
        }
        if let Some(estimated_minutes) = estimated_minutes {
            self.estimated_minutes = estimated_minutes;
        }
        if let Some(archived) = archived {
            self.archived = archived;
        }
        if let Some(position) = position {
            self.position = position;
        }
        self.updated_at = now;
    }

    fn set_status(&mut self, status: TaskStatus, now: OffsetDateTime) {
        match (self.status.is_done(), status.is_done()) {
            (false, true) => self.completed_at = Some(now),
            (true, false) => self.completed_at = None,
            _ => {}
        }
        self.status = status;
    }

    /// Find a subtask by id.
    #[must_use]
    pub fn subtask(&self, id: &SubtaskId) -> Option<&Subtask> {
        self.subtasks.iter().find(|subtask| &subtask.id == id)
    }

    pub(crate) fn subtask_mut(&mut self, id: &SubtaskId) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|subtask| &subtask.id == id)
    }

    /// `(completed, total)` subtask counts.
    #[must_use]
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|subtask| subtask.completed).count();
        (done, self.subtasks.len())
    }
}

impl SubtaskUpdate {
    pub(crate) fn apply_to(self, subtask: &mut Subtask, now: OffsetDateTime) {
        if let Some(title) = self.title {
            subtask.title = title;
        }
        if let Some(completed) = self.completed {
            subtask.set_completed(completed, now);
        }
    }
}

/// Payload for creating a task. Identifier, timestamps and position are
/// assigned when the draft is added to a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Initial status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Initial priority.
    #[serde(default)]
    pub priority: Priority,
    /// Owning project.
    pub project_id: ProjectId,
    /// Labels.
    #[serde(default)]
    pub labels: BTreeSet<LabelId>,
    /// Attachment references.
    #[serde(default)]
    pub attachments: Vec<AttachmentId>,
    /// Assignees.
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
    /// Creator.
    pub creator_id: UserId,
    /// Optional deadline.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    /// Optional start.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    /// Estimated effort in minutes.
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    /// Create as archived.
    #[serde(default)]
    pub archived: bool,
}

impl TaskDraft {
    /// Minimal draft: a title in the given project, everything else default.
    #[must_use]
    pub fn new(title: impl Into<String>, project_id: ProjectId, creator_id: UserId) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            priority: Priority::default(),
            project_id,
            labels: BTreeSet::new(),
            attachments: Vec::new(),
            assignee_ids: Vec::new(),
            creator_id,
            due_date: None,
            start_date: None,
            estimated_minutes: None,
            archived: false,
        }
    }
}

/// Partial task update. `None` leaves a field untouched; for optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    /// New title.
    pub title: Option<String>,
    /// New or cleared description.
    pub description: Option<Option<String>>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New priority.
    pub priority: Option<Priority>,
    /// Move to another project.
    pub project_id: Option<ProjectId>,
    /// Replace the label set.
    pub labels: Option<BTreeSet<LabelId>>,
    /// Replace the assignees.
    pub assignee_ids: Option<Vec<UserId>>,
    /// New or cleared due date.
    pub due_date: Option<Option<OffsetDateTime>>,
    /// New or cleared start date.
    pub start_date: Option<Option<OffsetDateTime>>,
    /// New or cleared estimate.
    pub estimated_minutes: Option<Option<u32>>,
    /// Archive or restore.
    pub archived: Option<bool>,
    /// New manual position.
    pub position: Option<i64>,
}

impl TaskUpdate {
    /// Returns true when no field is populated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.project_id.is_none()
            && self.labels.is_none()
            && self.assignee_ids.is_none()
            && self.due_date.is_none()
            && self.start_date.is_none()
            && self.estimated_minutes.is_none()
            && self.archived.is_none()
            && self.position.is_none()
    }
}

/// Per-project capability toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Priority preselected for new tasks.
    pub default_priority: Priority,
    /// Subtasks may be added.
    pub allow_subtasks: bool,
    /// Time tracking is enabled.
    pub allow_time_tracking: bool,
    /// Recurring tasks are enabled.
    pub allow_recurrence: bool,
    /// Completed tasks are listed in project views.
    pub show_completed_tasks: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            default_priority: Priority::Medium,
            allow_subtasks: true,
            allow_time_tracking: true,
            allow_recurrence: true,
            show_completed_tasks: true,
        }
    }
}

/// A named grouping of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: ProjectId,
    /// Name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Display color.
    pub color: String,
    /// Optional icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// Owner.
    pub owner_id: UserId,
    /// Other members.
    #[serde(default)]
    pub member_ids: Vec<UserId>,
    /// Pinned by the user.
    #[serde(default)]
    pub favorite: bool,
    /// Soft-delete flag.
    #[serde(default)]
    pub archived: bool,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last mutation time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Manual ordering hint.
    #[serde(default)]
    pub position: i64,
    /// Capability toggles.
    #[serde(default)]
    pub settings: ProjectSettings,
}

impl Project {
    /// The sentinel inbox project.
    #[must_use]
    pub fn inbox(owner_id: UserId, now: OffsetDateTime) -> Self {
        Self {
            id: ProjectId::inbox(),
            name: "Inbox".to_owned(),
            description: Some("Unorganized tasks".to_owned()),
            color: "#6366f1".to_owned(),
            icon: Some("inbox".to_owned()),
            owner_id,
            member_ids: Vec::new(),
            favorite: false,
            archived: false,
            created_at: now,
            updated_at: now,
            position: 0,
            settings: ProjectSettings::default(),
        }
    }

    /// Materialize a draft.
    #[must_use]
    pub fn from_draft(id: ProjectId, draft: ProjectDraft, now: OffsetDateTime, position: i64) -> Self {
        let ProjectDraft {
            name,
            description,
            color,
            icon,
            owner_id,
            member_ids,
            favorite,
            settings,
        } = draft;
        Self {
            id,
            name,
            description,
            color,
            icon,
            owner_id,
            member_ids,
            favorite,
            archived: false,
            created_at: now,
            updated_at: now,
            position,
            settings,
        }
    }

    pub(crate) fn apply_update(&mut self, update: ProjectUpdate, now: OffsetDateTime) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(icon) = update.icon {
            self.icon = icon;
        }
        if let Some(member_ids) = update.member_ids {
            self.member_ids = member_ids;
        }
        if let Some(favorite) = update.favorite {
            self.favorite = favorite;
        }
        if let Some(archived) = update.archived {
            self.archived = archived;
        }
        if let Some(settings) = update.settings {
            self.settings = settings;
        }
        self.updated_at = now;
    }
}

/// Payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    /// Name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Display color.
    pub color: String,
    /// Optional icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// Owner.
    pub owner_id: UserId,
    /// Other members.
    #[serde(default)]
    pub member_ids: Vec<UserId>,
    /// Pinned by the user.
    #[serde(default)]
    pub favorite: bool,
    /// Capability toggles.
    #[serde(default)]
    pub settings: ProjectSettings,
}

/// Partial project update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    /// New name.
    pub name: Option<String>,
    /// New or cleared description.
    pub description: Option<Option<String>>,
    /// New color.
    pub color: Option<String>,
    /// New or cleared icon.
    pub icon: Option<Option<String>>,
    /// Replace members.
    pub member_ids: Option<Vec<UserId>>,
    /// Pin or unpin.
    pub favorite: Option<bool>,
    /// Archive or restore.
    pub archived: Option<bool>,
    /// Replace settings.
    pub settings: Option<ProjectSettings>,
}

/// Many-to-many tag attachable to tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label identifier.
    pub id: LabelId,
    /// Name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Label {
    pub(crate) fn apply_update(&mut self, update: LabelUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
    }
}

/// Payload for creating a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDraft {
    /// Name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial label update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelUpdate {
    /// New name.
    pub name: Option<String>,
    /// New color.
    pub color: Option<String>,
    /// New or cleared description.
    pub description: Option<Option<String>>,
}
