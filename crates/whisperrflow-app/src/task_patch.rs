use std::collections::BTreeSet;

use thiserror::Error;
use time::{Time, UtcOffset};
use whisperrflow_core::{
    IdError, LabelId, ParseTokenError, Priority, ProjectId, Task, TaskStatus, TaskUpdate,
};

use crate::filter_util::{FilterBuildError, parse_instant};

/// Difference between two sets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetDiff<T> {
    /// Entries present in the desired set but missing from the current set.
    pub added: Vec<T>,
    /// Entries present in the current set but removed from the desired set.
    pub removed: Vec<T>,
}

impl<T> SetDiff<T> {
    /// Returns true when both added/removed are empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute differences between two sets.
#[must_use]
pub fn diff_sets<T: Ord + Clone>(current: &BTreeSet<T>, desired: &BTreeSet<T>) -> SetDiff<T> {
    SetDiff {
        added: desired.difference(current).cloned().collect(),
        removed: current.difference(desired).cloned().collect(),
    }
}

/// Requested change to an optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Overwrite with a new value.
    Set(T),
    /// Remove the value.
    Clear,
}

/// Errors raised while turning a raw edit request into a [`TaskUpdate`].
#[derive(Debug, Error)]
pub enum EditError {
    /// The new title is blank.
    #[error("title must not be empty")]
    EmptyTitle,
    /// A status or priority token was not recognised.
    #[error(transparent)]
    InvalidToken(#[from] ParseTokenError),
    /// An identifier was blank.
    #[error("invalid {field}: {source}")]
    InvalidId {
        /// Which input carried the identifier.
        field: &'static str,
        /// Underlying parse failure.
        #[source]
        source: IdError,
    },
    /// The due date could not be parsed.
    #[error(transparent)]
    InvalidDate(#[from] FilterBuildError),
    /// The same label was both added and removed.
    #[error("label {0} is both added and removed")]
    ConflictingLabel(String),
}

/// Result alias for edit conversion.
pub type EditResult<T> = Result<T, EditError>;

/// Raw edit request as typed by a user. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    /// New title.
    pub title: Option<String>,
    /// New or cleared description.
    pub description: Option<FieldPatch<String>>,
    /// Status token.
    pub status: Option<String>,
    /// Priority token.
    pub priority: Option<String>,
    /// Target project id.
    pub project: Option<String>,
    /// Label ids to attach.
    pub add_labels: Vec<String>,
    /// Label ids to detach.
    pub remove_labels: Vec<String>,
    /// Due date (RFC 3339 or `YYYY-MM-DD`) or clear.
    pub due: Option<FieldPatch<String>>,
    /// Estimated minutes or clear.
    pub estimate: Option<FieldPatch<u32>>,
    /// Archive or restore.
    pub archived: Option<bool>,
}

impl TaskEdit {
    /// Diff the request against `task`, keeping only fields that actually change.
    ///
    /// Date-only due values are placed at midnight in `offset`.
    ///
    /// # Errors
    /// Returns an error when a token, identifier or date is invalid, or when a
    /// label is both added and removed.
    pub fn into_update(self, task: &Task, offset: UtcOffset) -> EditResult<TaskUpdate> {
        let Self {
            title,
            description,
            status,
            priority,
            project,
            add_labels,
            remove_labels,
            due,
            estimate,
            archived,
        } = self;

        let mut update = TaskUpdate::default();

        if let Some(title) = title {
            let title = title.trim();
            if title.is_empty() {
                return Err(EditError::EmptyTitle);
            }
            if title != task.title {
                update.title = Some(title.to_owned());
            }
        }

        update.description = match description {
            Some(FieldPatch::Set(text)) if task.description.as_deref() != Some(text.as_str()) => {
                Some(Some(text))
            }
            Some(FieldPatch::Clear) if task.description.is_some() => Some(None),
            _ => None,
        };

        if let Some(token) = status {
            let status: TaskStatus = token.parse()?;
            update.status = (status != task.status).then_some(status);
        }
        if let Some(token) = priority {
            let priority: Priority = token.parse()?;
            update.priority = (priority != task.priority).then_some(priority);
        }
        if let Some(raw) = project {
            let project: ProjectId = raw.parse().map_err(|source| EditError::InvalidId {
                field: "project id",
                source,
            })?;
            update.project_id = (project != task.project_id).then_some(project);
        }

        let desired = desired_labels(&task.labels, &add_labels, &remove_labels)?;
        if !diff_sets(&task.labels, &desired).is_empty() {
            update.labels = Some(desired);
        }

        update.due_date = match due {
            Some(FieldPatch::Set(raw)) => {
                let due = parse_instant("due", &raw, offset, Time::MIDNIGHT)?;
                (task.due_date != Some(due)).then_some(Some(due))
            }
            Some(FieldPatch::Clear) if task.due_date.is_some() => Some(None),
            _ => None,
        };

        update.estimated_minutes = match estimate {
            Some(FieldPatch::Set(minutes)) if task.estimated_minutes != Some(minutes) => {
                Some(Some(minutes))
            }
            Some(FieldPatch::Clear) if task.estimated_minutes.is_some() => Some(None),
            _ => None,
        };

        update.archived = archived.filter(|flag| *flag != task.archived);

        Ok(update)
    }
}

fn parse_labels(raw: &[String]) -> EditResult<BTreeSet<LabelId>> {
    raw.iter()
        .map(|value| {
            value.parse().map_err(|source| EditError::InvalidId {
                field: "label id",
                source,
            })
        })
        .collect()
}

fn desired_labels(
    current: &BTreeSet<LabelId>,
    add: &[String],
    remove: &[String],
) -> EditResult<BTreeSet<LabelId>> {
    let add = parse_labels(add)?;
    let remove = parse_labels(remove)?;
    if let Some(conflict) = add.intersection(&remove).next() {
        return Err(EditError::ConflictingLabel(conflict.to_string()));
    }
    Ok(current
        .union(&add)
        .filter(|label| !remove.contains(*label))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};
    use whisperrflow_core::{TaskDraft, TaskId, UserId};

    fn task() -> Task {
        let mut draft = TaskDraft::new("Write docs", ProjectId::inbox(), UserId::new());
        draft.description = Some("first draft".into());
        draft.labels.insert(label("label-1"));
        draft.estimated_minutes = Some(30);
        Task::from_draft(TaskId::new(), draft, datetime!(2025-01-01 0:00 UTC), 0)
    }

    fn label(raw: &str) -> LabelId {
        raw.parse().unwrap_or_else(|err| panic!("label id: {err}"))
    }

    fn update(edit: TaskEdit) -> TaskUpdate {
        edit.into_update(&task(), UtcOffset::UTC)
            .unwrap_or_else(|err| panic!("edit must convert: {err}"))
    }

    #[test]
    fn unchanged_fields_produce_an_empty_update() {
        let edit = TaskEdit {
            title: Some(" Write docs ".into()),
            description: Some(FieldPatch::Set("first draft".into())),
            status: Some("todo".into()),
            priority: Some("medium".into()),
            project: Some("inbox".into()),
            add_labels: vec!["label-1".into()],
            estimate: Some(FieldPatch::Set(30)),
            archived: Some(false),
            ..TaskEdit::default()
        };
        assert!(update(edit).is_empty());
    }

    #[test]
    fn changed_fields_are_carried_over() {
        let edit = TaskEdit {
            title: Some("Write the docs".into()),
            status: Some("in-progress".into()),
            priority: Some("urgent".into()),
            project: Some("project-2".into()),
            archived: Some(true),
            ..TaskEdit::default()
        };
        let update = update(edit);
        assert_eq!(update.title.as_deref(), Some("Write the docs"));
        assert_eq!(update.status, Some(TaskStatus::InProgress));
        assert_eq!(update.priority, Some(Priority::Urgent));
        assert_eq!(update.project_id.as_ref().map(ProjectId::as_str), Some("project-2"));
        assert_eq!(update.archived, Some(true));
    }

    #[test]
    fn clears_only_populated_fields() {
        let edit = TaskEdit {
            description: Some(FieldPatch::Clear),
            due: Some(FieldPatch::Clear),
            estimate: Some(FieldPatch::Clear),
            ..TaskEdit::default()
        };
        let update = update(edit);
        assert_eq!(update.description, Some(None));
        assert_eq!(update.due_date, None);
        assert_eq!(update.estimated_minutes, Some(None));
    }

    #[test]
    fn labels_are_added_and_removed() {
        let edit = TaskEdit {
            add_labels: vec!["label-2".into()],
            remove_labels: vec!["label-1".into()],
            ..TaskEdit::default()
        };
        let labels = update(edit)
            .labels
            .unwrap_or_else(|| panic!("labels must change"));
        assert_eq!(labels, BTreeSet::from([label("label-2")]));
    }

    #[test]
    fn conflicting_labels_are_rejected() {
        let edit = TaskEdit {
            add_labels: vec!["label-3".into()],
            remove_labels: vec!["label-3".into()],
            ..TaskEdit::default()
        };
        assert!(matches!(
            edit.into_update(&task(), UtcOffset::UTC),
            Err(EditError::ConflictingLabel(label)) if label == "label-3"
        ));
    }

    #[test]
    fn date_only_due_uses_the_offset() {
        let edit = TaskEdit {
            due: Some(FieldPatch::Set("2025-02-10".into())),
            ..TaskEdit::default()
        };
        let update = edit
            .into_update(&task(), offset!(-5))
            .unwrap_or_else(|err| panic!("edit must convert: {err}"));
        assert_eq!(update.due_date, Some(Some(datetime!(2025-02-10 00:00 -5))));
    }

    #[test]
    fn invalid_inputs_are_typed() {
        let blank = TaskEdit {
            title: Some("   ".into()),
            ..TaskEdit::default()
        };
        assert!(matches!(
            blank.into_update(&task(), UtcOffset::UTC),
            Err(EditError::EmptyTitle)
        ));

        let status = TaskEdit {
            status: Some("finished".into()),
            ..TaskEdit::default()
        };
        let Err(err) = status.into_update(&task(), UtcOffset::UTC) else {
            panic!("unknown status must be rejected");
        };
        assert_eq!(err.to_string(), "invalid status: finished");

        let due = TaskEdit {
            due: Some(FieldPatch::Set("soon".into())),
            ..TaskEdit::default()
        };
        assert!(matches!(
            due.into_update(&task(), UtcOffset::UTC),
            Err(EditError::InvalidDate(_))
        ));
    }

    #[test]
    fn diff_sets_detects_added_and_removed_items() {
        let current = BTreeSet::from(["a".to_string(), "b".to_string()]);
        let desired = BTreeSet::from(["b".to_string(), "c".to_string()]);

        let diff = diff_sets(&current, &desired);
        assert_eq!(diff.added, vec!["c"]);
        assert_eq!(diff.removed, vec!["a"]);
    }
}
