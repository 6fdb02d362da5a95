//! Conjunctive task filters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::{LabelId, ProjectId};
use crate::model::Task;
use crate::state::{Priority, TaskStatus};
use crate::text_matcher::TextMatcher;

/// Inclusive due-date window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueRange {
    /// Earliest accepted due date.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    /// Latest accepted due date.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub to: Option<OffsetDateTime>,
}

impl DueRange {
    /// Returns true when neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Check a task's due date against the window.
    ///
    /// Tasks without a due date never satisfy a bounded window.
    #[must_use]
    pub fn contains(&self, due: Option<OffsetDateTime>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(due) = due else {
            return false;
        };
        self.from.is_none_or(|from| due >= from) && self.to.is_none_or(|to| due <= to)
    }
}

/// Filter specification. Every populated predicate must hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Accepted statuses (empty = any).
    #[serde(default)]
    pub statuses: BTreeSet<TaskStatus>,
    /// Accepted priorities (empty = any).
    #[serde(default)]
    pub priorities: BTreeSet<Priority>,
    /// Required project.
    #[serde(default)]
    pub project: Option<ProjectId>,
    /// Labels, of which a task must carry at least one (empty = any).
    #[serde(default)]
    pub labels: BTreeSet<LabelId>,
    /// Due-date window.
    #[serde(default)]
    pub due: Option<DueRange>,
    /// Keep tasks whose status is done.
    #[serde(default = "default_true")]
    pub show_completed: bool,
    /// Keep archived tasks.
    #[serde(default)]
    pub show_archived: bool,
    /// Free-text query over title and description.
    #[serde(default)]
    pub text: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            statuses: BTreeSet::new(),
            priorities: BTreeSet::new(),
            project: None,
            labels: BTreeSet::new(),
            due: None,
            show_completed: true,
            show_archived: false,
            text: None,
        }
    }
}

impl TaskFilter {
    /// Returns true when the filter only carries the default visibility flags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.priorities.is_empty()
            && self.project.is_none()
            && self.labels.is_empty()
            && self.due.is_none_or(|range| range.is_unbounded())
            && self.show_completed
            && !self.show_archived
            && self.text.as_deref().is_none_or(|text| text.trim().is_empty())
    }

    /// Determine whether the task satisfies every populated predicate.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.compile().matches(task)
    }

    /// Return the matching tasks as a new collection, preserving input order.
    #[must_use]
    pub fn apply<'a, I>(&self, tasks: I) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let compiled = self.compile();
        tasks.into_iter().filter(|task| compiled.matches(task)).collect()
    }

    /// Copy of this filter with the free-text query replaced.
    #[must_use]
    pub fn with_text(&self, text: Option<&str>) -> Self {
        Self {
            text: text.map(str::to_owned),
            ..self.clone()
        }
    }

    fn compile(&self) -> CompiledFilter<'_> {
        CompiledFilter {
            filter: self,
            matcher: self.text.as_deref().and_then(TextMatcher::new),
        }
    }
}

struct CompiledFilter<'a> {
    filter: &'a TaskFilter,
    matcher: Option<TextMatcher>,
}

impl CompiledFilter<'_> {
    fn matches(&self, task: &Task) -> bool {
        let filter = self.filter;

        if !filter.statuses.is_empty() && !filter.statuses.contains(&task.status) {
            return false;
        }
        if !filter.priorities.is_empty() && !filter.priorities.contains(&task.priority) {
            return false;
        }
        if filter
            .project
            .as_ref()
            .is_some_and(|project| *project != task.project_id)
        {
            return false;
        }
        if !filter.labels.is_empty() && filter.labels.is_disjoint(&task.labels) {
            return false;
        }
        if !filter.show_completed && task.is_done() {
            return false;
        }
        if !filter.show_archived && task.archived {
            return false;
        }
        if filter.due.is_some_and(|range| !range.contains(task.due_date)) {
            return false;
        }
        self.matcher.as_ref().is_none_or(|matcher| matcher.matches(task))
    }
}

/// Convenience builder for [`TaskFilter`] values.
#[derive(Debug, Clone, Default)]
pub struct TaskFilterBuilder {
    filter: TaskFilter,
}

impl TaskFilterBuilder {
    /// Start from the default filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the given statuses.
    #[must_use]
    pub fn statuses<I: IntoIterator<Item = TaskStatus>>(mut self, statuses: I) -> Self {
        self.filter.statuses.extend(statuses);
        self
    }

    /// Accept the given priorities.
    #[must_use]
    pub fn priorities<I: IntoIterator<Item = Priority>>(mut self, priorities: I) -> Self {
        self.filter.priorities.extend(priorities);
        self
    }

    /// Require a project.
    #[must_use]
    pub fn project(mut self, project: ProjectId) -> Self {
        self.filter.project = Some(project);
        self
    }

    /// Require at least one of the labels.
    #[must_use]
    pub fn labels<I: IntoIterator<Item = LabelId>>(mut self, labels: I) -> Self {
        self.filter.labels.extend(labels);
        self
    }

    /// Restrict due dates to a window.
    #[must_use]
    pub fn due(mut self, from: Option<OffsetDateTime>, to: Option<OffsetDateTime>) -> Self {
        self.filter.due = Some(DueRange { from, to });
        self
    }

    /// Toggle visibility of completed tasks.
    #[must_use]
    pub const fn show_completed(mut self, show: bool) -> Self {
        self.filter.show_completed = show;
        self
    }

    /// Toggle visibility of archived tasks.
    #[must_use]
    pub const fn show_archived(mut self, show: bool) -> Self {
        self.filter.show_archived = show;
        self
    }

    /// Set the free-text query. Blank input clears it.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        self.filter.text = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> TaskFilter {
        self.filter
    }
}
