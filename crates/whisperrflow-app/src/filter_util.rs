
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, OffsetDateTime, Time, UtcOffset};
use whisperrflow_core::{
    IdError, LabelId, ParseTokenError, Priority, ProjectId, SortDirection, SortField, TaskFilter,
    TaskFilterBuilder as CoreTaskFilterBuilder, TaskSort, TaskStatus,
};

/// Error type returned while constructing filters and sorts from user-facing inputs.
#[derive(Debug, Error)]
pub enum FilterBuildError {
    /// A status, priority or sort token was not recognised.
    #[error(transparent)]
    InvalidToken(#[from] ParseTokenError),
    /// An identifier was empty.
    #[error("invalid {field}: {source}")]
    InvalidId {
        /// Which input carried the identifier.
        field: &'static str,
        /// Underlying parse failure.
        #[source]
        source: IdError,
    },
    /// A date bound was neither RFC 3339 nor `YYYY-MM-DD`.
    #[error("invalid {field} date: {value} (expected RFC 3339 or YYYY-MM-DD)")]
    InvalidDate {
        /// Which bound failed.
        field: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Result alias for filter construction helpers.
pub type FilterBuildResult<T> = Result<T, FilterBuildError>;

/// Builder that accepts user-facing strings and normalizes them into [`TaskFilter`] values.
#[derive(Debug, Clone, Default)]
pub struct TaskFilterBuilder {
    statuses: Vec<TaskStatus>,
    priorities: Vec<Priority>,
    project: Option<ProjectId>,
    labels: Vec<LabelId>,
    text: Option<String>,
    due_from: Option<OffsetDateTime>,
    due_until: Option<OffsetDateTime>,
    show_completed: Option<bool>,
    show_archived: Option<bool>,
    offset: Option<UtcOffset>,
}

impl TaskFilterBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset used to interpret date-only bounds (UTC when unset).
    #[must_use]
    pub const fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Extend the accepted statuses.
    ///
    /// # Errors
    /// Returns an error if any token is not a known status.
    pub fn with_statuses(mut self, tokens: &[String]) -> FilterBuildResult<Self> {
        self.statuses.extend(parse_tokens::<TaskStatus>(tokens)?);
        Ok(self)
    }

    /// Extend the accepted priorities.
    ///
    /// # Errors
    /// Returns an error if any token is not a known priority.
    pub fn with_priorities(mut self, tokens: &[String]) -> FilterBuildResult<Self> {
        self.priorities.extend(parse_tokens::<Priority>(tokens)?);
        Ok(self)
    }

    /// Require a project.
    ///
    /// # Errors
    /// Returns an error if the identifier is blank.
    pub fn with_project(mut self, project: Option<&str>) -> FilterBuildResult<Self> {
        self.project = project
            .map(|raw| {
                raw.parse()
                    .map_err(|source| FilterBuildError::InvalidId {
                        field: "project id",
                        source,
                    })
            })
            .transpose()?;
        Ok(self)
    }

    /// Extend the label list (a task must carry at least one of them).
    ///
    /// # Errors
    /// Returns an error if any identifier is blank.
    pub fn with_labels(mut self, labels: &[String]) -> FilterBuildResult<Self> {
        for raw in labels {
            let label = raw.parse().map_err(|source| FilterBuildError::InvalidId {
                field: "label id",
                source,
            })?;
            self.labels.push(label);
        }
        Ok(self)
    }

    /// Configure the optional search text (whitespace-only inputs become `None`).
    #[must_use]
    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text.and_then(|raw| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });
        self
    }

    /// Configure the due-date window from user input.
    ///
    /// Date-only values cover the whole day: `from` starts at midnight and
    /// `until` runs to the last instant of the day.
    ///
    /// # Errors
    /// Returns an error if either bound fails to parse.
    pub fn with_due_range(mut self, from: Option<&str>, until: Option<&str>) -> FilterBuildResult<Self> {
        let offset = self.offset.unwrap_or(UtcOffset::UTC);
        self.due_from = parse_bound("due_from", from, offset, Time::MIDNIGHT)?;
        self.due_until = parse_bound("due_until", until, offset, END_OF_DAY)?;
        Ok(self)
    }

    /// Override the completed-task visibility.
    #[must_use]
    pub const fn show_completed(mut self, show: Option<bool>) -> Self {
        self.show_completed = show;
        self
    }

    /// Override the archived-task visibility.
    #[must_use]
    pub const fn show_archived(mut self, show: Option<bool>) -> Self {
        self.show_archived = show;
        self
    }

    /// Build the final [`TaskFilter`] on top of `base` visibility defaults.
    #[must_use]
    pub fn build_on(self, base: &TaskFilter) -> TaskFilter {
        let mut builder = CoreTaskFilterBuilder::new()
            .statuses(self.statuses)
            .priorities(self.priorities)
            .labels(self.labels)
            .show_completed(self.show_completed.unwrap_or(base.show_completed))
            .show_archived(self.show_archived.unwrap_or(base.show_archived));

        if let Some(project) = self.project {
            builder = builder.project(project);
        }
        if let Some(text) = self.text {
            builder = builder.text(text);
        }
        if self.due_from.is_some() || self.due_until.is_some() {
            builder = builder.due(self.due_from, self.due_until);
        }

        builder.build()
    }

    /// Build the final [`TaskFilter`] on top of the default visibility flags.
    #[must_use]
    pub fn build(self) -> TaskFilter {
        self.build_on(&TaskFilter::default())
    }
}

/// Parse a sort request, falling back to `fallback` for missing parts.
///
/// # Errors
/// Returns an error if a token is not a known field or direction.
pub fn parse_sort(
    field: Option<&str>,
    direction: Option<&str>,
    fallback: TaskSort,
) -> FilterBuildResult<TaskSort> {
    let field = field
        .map(str::parse::<SortField>)
        .transpose()?
        .unwrap_or(fallback.field);
    let direction = direction
        .map(str::parse::<SortDirection>)
        .transpose()?
        .unwrap_or(fallback.direction);
    Ok(TaskSort::new(field, direction))
}

/// Parse an RFC3339 timestamp string.
///
/// # Errors
/// Returns an error if the string does not conform to RFC3339.
pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(s.trim(), &Rfc3339)
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns an error if the string is not a calendar date.
pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
}

/// Parse a user-supplied instant: RFC 3339, or a date placed at `time` in `offset`.
///
/// # Errors
/// Returns an error naming `field` when neither format matches.
pub fn parse_instant(
    field: &'static str,
    raw: &str,
    offset: UtcOffset,
    time: Time,
) -> FilterBuildResult<OffsetDateTime> {
    parse_timestamp(raw)
        .or_else(|_| parse_date(raw).map(|date| date.with_time(time).assume_offset(offset)))
        .map_err(|_| FilterBuildError::InvalidDate {
            field,
            value: raw.trim().to_owned(),
        })
}

fn parse_bound(
    field: &'static str,
    value: Option<&str>,
    offset: UtcOffset,
    time: Time,
) -> FilterBuildResult<Option<OffsetDateTime>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_instant(field, raw, offset, time).map(Some)
}

const END_OF_DAY: Time = time!(23:59:59.999999999);

fn parse_tokens<T>(tokens: &[String]) -> FilterBuildResult<Vec<T>>
where
    T: std::str::FromStr<Err = ParseTokenError>,
{
    tokens
        .iter()
        .flat_map(|token| token.split(','))
        .filter(|token| !token.trim().is_empty())
        .map(|token| token.parse::<T>().map_err(FilterBuildError::from))
        .collect()
}

impl FilterBuildError {
    /// Convert the error into a message that is friendly for end-users.
    #[must_use]
    pub fn describe_user_facing(&self) -> String {
        match self {
            Self::InvalidToken(err) => format!("unrecognised {}: '{}'", err.kind, err.token),
            Self::InvalidId { field, .. } => format!("{field} must not be empty"),
            Self::InvalidDate { field, value } => {
                format!("{field} '{value}' is not a date (use YYYY-MM-DD or RFC 3339)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Display;

    use super::*;
    use time::macros::{datetime, offset};

    fn ok<T, E: Display>(result: Result<T, E>, context: &str) -> T {
        result.unwrap_or_else(|err| panic!("{context}: {err}"))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn tokens_accept_comma_separated_lists() {
        let filter = ok(
            TaskFilterBuilder::new().with_statuses(&strings(&["todo,in-progress", "DONE"])),
            "parse statuses",
        )
        .build();
        assert_eq!(filter.statuses.len(), 3);
        assert!(filter.statuses.contains(&TaskStatus::InProgress));
    }

    #[test]
    fn unknown_priority_is_reported() {
        let Err(err) = TaskFilterBuilder::new().with_priorities(&strings(&["asap"])) else {
            panic!("asap must be rejected");
        };
        assert_eq!(err.to_string(), "invalid priority: asap");
        assert_eq!(err.describe_user_facing(), "unrecognised priority: 'asap'");
    }

    #[test]
    fn date_only_bounds_cover_whole_days() {
        let filter = ok(
            TaskFilterBuilder::new()
                .with_offset(offset!(+2))
                .with_due_range(Some("2025-03-01"), Some("2025-03-02")),
            "parse due range",
        )
        .build();
        let range = filter.due.unwrap_or_else(|| panic!("due range must be set"));
        assert_eq!(range.from, Some(datetime!(2025-03-01 00:00 +2)));
        assert_eq!(
            range.to,
            Some(datetime!(2025-03-02 23:59:59.999999999 +2))
        );
    }

    #[test]
    fn rfc3339_bounds_are_kept_verbatim() {
        let filter = ok(
            TaskFilterBuilder::new().with_due_range(Some("2025-03-01T09:30:00Z"), None),
            "parse due range",
        )
        .build();
        let range = filter.due.unwrap_or_else(|| panic!("due range must be set"));
        assert_eq!(range.from, Some(datetime!(2025-03-01 09:30 UTC)));
        assert!(range.to.is_none());
    }

    #[test]
    fn invalid_dates_name_the_bound() {
        let Err(err) = TaskFilterBuilder::new().with_due_range(None, Some("next week")) else {
            panic!("free text date must be rejected");
        };
        assert!(err.to_string().starts_with("invalid due_until date: next week"));
    }

    #[test]
    fn builder_full_workflow() -> FilterBuildResult<()> {
        let filter = TaskFilterBuilder::new()
            .with_project(Some("inbox"))?
            .with_labels(&strings(&["label-1"]))?
            .with_priorities(&strings(&["urgent"]))?
            .with_text(Some("  Report ".into()))
            .show_completed(Some(false))
            .build();

        assert_eq!(filter.project, Some(ProjectId::inbox()));
        assert_eq!(filter.labels.len(), 1);
        assert!(filter.priorities.contains(&Priority::Urgent));
        assert_eq!(filter.text.as_deref(), Some("Report"));
        assert!(!filter.show_completed);
        assert!(!filter.show_archived);
        Ok(())
    }

    #[test]
    fn build_on_keeps_base_visibility() {
        let base = TaskFilter {
            show_archived: true,
            ..TaskFilter::default()
        };
        let filter = TaskFilterBuilder::new().build_on(&base);
        assert!(filter.show_archived);
        assert!(filter.show_completed);
    }

    #[test]
    fn blank_project_is_rejected() {
        assert!(matches!(
            TaskFilterBuilder::new().with_project(Some(" ")),
            Err(FilterBuildError::InvalidId { field: "project id", .. })
        ));
    }

    #[test]
    fn sort_parsing_uses_fallback_parts() {
        let fallback = TaskSort::new(SortField::Position, SortDirection::Asc);
        let sort = ok(parse_sort(None, Some("desc"), fallback), "sort");
        assert_eq!(sort, TaskSort::new(SortField::Position, SortDirection::Desc));
        let sort = ok(parse_sort(Some("title"), None, fallback), "sort");
        assert_eq!(sort, TaskSort::new(SortField::Title, SortDirection::Asc));
        assert!(parse_sort(Some("colour"), None, fallback).is_err());
    }
}
