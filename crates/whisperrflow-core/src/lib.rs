//! Domain types, filters, statistics & the action reducer for WhisperrFlow.

/// Task filter specification and evaluation.
pub mod filter;
/// Identifier types.
pub mod id;
/// Tasks, projects, labels and their drafts and updates.
pub mod model;
/// Task state, actions and the reducer.
pub mod reducer;
/// Sort specification and comparator.
pub mod sort;
/// Status and priority enumerations.
pub mod state;
/// Derived statistics.
pub mod stats;
/// Free-text matching.
pub mod text_matcher;

pub use filter::{DueRange, TaskFilter, TaskFilterBuilder};
pub use id::{
    AttachmentId, CommentId, INBOX_PROJECT_ID, IdError, LabelId, ProjectId, SubtaskId, TaskId,
    UserId,
};
pub use model::{
    Author, Comment, Label, LabelDraft, LabelUpdate, Project, ProjectDraft, ProjectSettings,
    ProjectUpdate, Subtask, SubtaskUpdate, Task, TaskDraft, TaskUpdate,
};
pub use reducer::{Action, EntityRef, Outcome, Reduction, TaskState, reduce};
pub use sort::{SortDirection, SortField, TaskSort};
pub use state::{ParseTokenError, Priority, TaskStatus};
pub use stats::{DayBounds, ProjectProgress, TaskStats};
pub use text_matcher::TextMatcher;
