//! Stable single-field task ordering.

use std::cmp::Ordering;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::Task;
use crate::state::ParseTokenError;

/// Field a task list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    /// Due date; tasks without one sort last when ascending.
    #[default]
    DueDate,
    /// Priority rank, urgent first.
    Priority,
    /// Creation time.
    CreatedAt,
    /// Last update time.
    UpdatedAt,
    /// Case-insensitive title.
    Title,
    /// Status rank, todo first.
    Status,
    /// Manual position.
    Position,
}

impl SortField {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DueDate => "due-date",
            Self::Priority => "priority",
            Self::CreatedAt => "created-at",
            Self::UpdatedAt => "updated-at",
            Self::Title => "title",
            Self::Status => "status",
            Self::Position => "position",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "due" | "due_date" | "duedate" => Ok(Self::DueDate),
            "priority" => Ok(Self::Priority),
            "created" | "created_at" | "createdat" => Ok(Self::CreatedAt),
            "updated" | "updated_at" | "updatedat" => Ok(Self::UpdatedAt),
            "title" => Ok(Self::Title),
            "status" => Ok(Self::Status),
            "position" | "manual" => Ok(Self::Position),
            _ => Err(ParseTokenError {
                kind: "sort field",
                token: s.to_owned(),
            }),
        }
    }
}

/// Ascending or descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(ParseTokenError {
                kind: "sort direction",
                token: s.to_owned(),
            }),
        }
    }
}

/// Sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TaskSort {
    /// Field to compare.
    pub field: SortField,
    /// Direction applied to the comparison.
    pub direction: SortDirection,
}

impl TaskSort {
    /// Build a sort specification.
    #[must_use]
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Compare two tasks under this specification.
    #[must_use]
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ordering = match self.field {
            SortField::DueDate => compare_due(a, b),
            SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Title => compare_titles(&a.title, &b.title),
            SortField::Status => a.status.rank().cmp(&b.status.rank()),
            SortField::Position => a.position.cmp(&b.position),
        };
        self.direction.apply(ordering)
    }

    /// Return the tasks in sorted order without touching the input.
    ///
    /// The sort is stable: tasks comparing equal keep their input order.
    #[must_use]
    pub fn apply<'a, I>(&self, tasks: I) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut sorted: Vec<&Task> = tasks.into_iter().collect();
        sorted.sort_by(|a, b| self.compare(a, b));
        sorted
    }
}

fn compare_due(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Lowercased title with diacritics stripped, so `Éclair` files under `e`.
fn collation_key(title: &str) -> String {
    title
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}
