//! Dashboard counters derived from a task collection and an explicit `now`.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, PrimitiveDateTime, Time};

use crate::id::ProjectId;
use crate::model::Task;
use crate::state::{Priority, TaskStatus};

/// Day boundaries computed in the offset of a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBounds {
    /// Midnight starting the reference day.
    pub today: OffsetDateTime,
    /// Midnight starting the following day.
    pub tomorrow: OffsetDateTime,
    /// Midnight two days after `today`.
    pub day_after: OffsetDateTime,
    /// Midnight seven days after `today`.
    pub next_week: OffsetDateTime,
}

impl DayBounds {
    /// Compute the boundaries around `now` using `now`'s UTC offset.
    ///
    /// Bounds past the last representable instant saturate to it.
    #[must_use]
    pub fn around(now: OffsetDateTime) -> Self {
        let today = now.replace_time(Time::MIDNIGHT);
        Self {
            today,
            tomorrow: days_after(today, 1),
            day_after: days_after(today, 2),
            next_week: days_after(today, 7),
        }
    }
}

fn days_after(start: OffsetDateTime, days: i64) -> OffsetDateTime {
    start
        .checked_add(Duration::days(days))
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_offset(start.offset()))
}

/// Aggregate counters over non-archived tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    /// Non-archived tasks.
    pub total: usize,
    /// Non-archived tasks in `done`.
    pub completed: usize,
    /// Open tasks due before the start of today.
    pub overdue: usize,
    /// Open tasks due today.
    pub due_today: usize,
    /// Open tasks due tomorrow.
    pub due_tomorrow: usize,
    /// Open tasks due after today and within the next week.
    pub upcoming: usize,
    /// Tasks in progress.
    pub in_progress: usize,
    /// Open urgent tasks.
    pub urgent: usize,
    /// Open high-priority tasks.
    pub high_priority: usize,
    /// Open tasks sitting in the inbox.
    pub inbox: usize,
    /// Rounded completed/total percentage, 0 when there are no tasks.
    pub completion_rate: u8,
}

impl TaskStats {
    /// Compute statistics for `tasks` as seen at `now`.
    #[must_use]
    pub fn compute<'a, I>(tasks: I, now: OffsetDateTime) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let bounds = DayBounds::around(now);
        let mut stats = Self::default();

        for task in tasks.into_iter().filter(|task| !task.archived) {
            stats.total += 1;
            if task.is_done() {
                stats.completed += 1;
                continue;
            }

            if task.status == TaskStatus::InProgress {
                stats.in_progress += 1;
            }
            match task.priority {
                Priority::Urgent => stats.urgent += 1,
                Priority::High => stats.high_priority += 1,
                Priority::Medium | Priority::Low => {}
            }
            if task.project_id.is_inbox() {
                stats.inbox += 1;
            }

            if let Some(due) = task.due_date {
                if due < bounds.today {
                    stats.overdue += 1;
                } else if due < bounds.tomorrow {
                    stats.due_today += 1;
                } else if due < bounds.next_week {
                    stats.upcoming += 1;
                    if due < bounds.day_after {
                        stats.due_tomorrow += 1;
                    }
                }
            }
        }

        stats.completion_rate = percentage(stats.completed, stats.total);
        stats
    }
}

/// Completion progress of a single project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProgress {
    /// Project the counts belong to.
    pub project_id: ProjectId,
    /// Non-archived tasks in the project.
    pub total: usize,
    /// Of which done.
    pub completed: usize,
    /// Rounded percentage.
    pub percent: u8,
}

impl ProjectProgress {
    /// Count the non-archived tasks of `project_id`.
    #[must_use]
    pub fn compute<'a, I>(tasks: I, project_id: &ProjectId) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let (total, completed) = tasks
            .into_iter()
            .filter(|task| !task.archived && &task.project_id == project_id)
            .fold((0, 0), |(total, completed), task| {
                (total + 1, completed + usize::from(task.is_done()))
            });
        Self {
            project_id: project_id.clone(),
            total,
            completed,
            percent: percentage(completed, total),
        }
    }
}

/// Round-half-up integer percentage of `part / whole`.
fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let rounded = (part * 100 + whole / 2) / whole;
    u8::try_from(rounded).unwrap_or(u8::MAX)
}
