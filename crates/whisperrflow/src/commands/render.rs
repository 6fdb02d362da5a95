use std::io::{self, Write};

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;
use whisperrflow_core::{Label, Project, ProjectProgress, Task, TaskState, TaskStats};

/// Project plus its completion progress.
#[derive(Debug, Serialize)]
pub struct ProjectRow<'a> {
    #[serde(flatten)]
    pub project: &'a Project,
    pub progress: ProjectProgress,
}

/// Label plus the number of tasks carrying it.
#[derive(Debug, Serialize)]
pub struct LabelRow<'a> {
    #[serde(flatten)]
    pub label: &'a Label,
    pub tasks: usize,
}

/// Dashboard payload for `stats --format json`.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub stats: TaskStats,
    pub projects: Vec<ProjectProgress>,
}

pub fn format_day(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| at.date().to_string())
}

fn or_dash(value: String) -> String {
    if value.is_empty() { "-".to_owned() } else { value }
}

fn label_names(state: &TaskState, task: &Task) -> String {
    let names: Vec<&str> = task
        .labels
        .iter()
        .map(|id| state.label(id).map_or(id.as_str(), |label| label.name.as_str()))
        .collect();
    or_dash(names.join(", "))
}

fn project_name<'a>(state: &'a TaskState, task: &'a Task) -> &'a str {
    state
        .project(&task.project_id)
        .map_or(task.project_id.as_str(), |project| project.name.as_str())
}

pub fn task_table<W: Write>(out: &mut W, state: &TaskState, tasks: &[&Task]) -> io::Result<()> {
    writeln!(out, "ID | Status | Priority | Title | Project | Labels | Due")?;
    writeln!(out, "-- | ------ | -------- | ----- | ------- | ------ | ---")?;
    for task in tasks {
        let due = task.due_date.map_or_else(|| "-".to_owned(), format_day);
        writeln!(
            out,
            "{} | {} | {} | {} | {} | {} | {}",
            task.id,
            task.status,
            task.priority,
            task.title,
            project_name(state, task),
            label_names(state, task),
            due
        )?;
    }
    Ok(())
}

pub fn task_detail<W: Write>(out: &mut W, state: &TaskState, task: &Task) -> io::Result<()> {
    writeln!(out, "{}  {}", task.id, task.title)?;
    writeln!(out, "status:   {}", task.status)?;
    writeln!(out, "priority: {}", task.priority)?;
    writeln!(out, "project:  {}", project_name(state, task))?;
    writeln!(out, "labels:   {}", label_names(state, task))?;
    if let Some(due) = task.due_date {
        writeln!(out, "due:      {}", format_day(due))?;
    }
    if let Some(minutes) = task.estimated_minutes {
        writeln!(out, "estimate: {minutes}m")?;
    }
    if task.archived {
        writeln!(out, "archived: yes")?;
    }
    if let Some(description) = &task.description {
        writeln!(out)?;
        writeln!(out, "{description}")?;
    }
    if !task.subtasks.is_empty() {
        let (done, total) = task.subtask_progress();
        writeln!(out)?;
        writeln!(out, "subtasks ({done}/{total}):")?;
        for subtask in &task.subtasks {
            let mark = if subtask.completed { 'x' } else { ' ' };
            writeln!(out, "  [{mark}] {} {}", subtask.id, subtask.title)?;
        }
    }
    if !task.comments.is_empty() {
        writeln!(out)?;
        writeln!(out, "comments:")?;
        for comment in &task.comments {
            writeln!(
                out,
                "  {} ({}): {}",
                comment.author.name,
                format_day(comment.created_at),
                comment.content
            )?;
        }
    }
    Ok(())
}

pub fn stats<W: Write>(out: &mut W, report: &StatsReport, state: &TaskState) -> io::Result<()> {
    let StatsReport { stats, projects } = report;
    writeln!(out, "total:         {}", stats.total)?;
    writeln!(
        out,
        "completed:     {} ({}%)",
        stats.completed, stats.completion_rate
    )?;
    writeln!(out, "overdue:       {}", stats.overdue)?;
    writeln!(out, "due today:     {}", stats.due_today)?;
    writeln!(out, "due tomorrow:  {}", stats.due_tomorrow)?;
    writeln!(out, "upcoming:      {}", stats.upcoming)?;
    writeln!(out, "in progress:   {}", stats.in_progress)?;
    writeln!(out, "urgent:        {}", stats.urgent)?;
    writeln!(out, "high priority: {}", stats.high_priority)?;
    writeln!(out, "inbox:         {}", stats.inbox)?;
    if projects.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    for progress in projects {
        let name = state
            .project(&progress.project_id)
            .map_or(progress.project_id.as_str(), |project| project.name.as_str());
        writeln!(
            out,
            "{name}: {}/{} ({}%)",
            progress.completed, progress.total, progress.percent
        )?;
    }
    Ok(())
}

pub fn project_table<W: Write>(out: &mut W, rows: &[ProjectRow<'_>]) -> io::Result<()> {
    writeln!(out, "ID | Name | Tasks | Done | Favorite")?;
    writeln!(out, "-- | ---- | ----- | ---- | --------")?;
    for row in rows {
        writeln!(
            out,
            "{} | {} | {} | {}% | {}",
            row.project.id,
            row.project.name,
            row.progress.total,
            row.progress.percent,
            if row.project.favorite { "yes" } else { "-" }
        )?;
    }
    Ok(())
}

pub fn label_table<W: Write>(out: &mut W, rows: &[LabelRow<'_>]) -> io::Result<()> {
    writeln!(out, "ID | Name | Color | Tasks")?;
    writeln!(out, "-- | ---- | ----- | -----")?;
    for row in rows {
        writeln!(
            out,
            "{} | {} | {} | {}",
            row.label.id, row.label.name, row.label.color, row.tasks
        )?;
    }
    Ok(())
}
