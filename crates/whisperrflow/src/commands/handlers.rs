use std::collections::BTreeSet;
use std::io::Write;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use time::{Time, UtcOffset};
use whisperrflow_app::{
    DispatchError, FieldPatch, FilterBuildError, FlowConfig, FlowService, StateStore, TaskEdit,
    TaskFilterBuilder, parse_instant, parse_sort, resolve_author, sample_state,
};
use whisperrflow_core::{
    EntityRef, IdError, LabelDraft, LabelId, LabelUpdate, Priority, Project, ProjectDraft,
    ProjectId, ProjectSettings, ProjectUpdate, SubtaskId, SubtaskUpdate, TaskDraft, TaskFilter,
    TaskId, TaskSort, TaskState, TaskStatus,
};

use super::render::{self, LabelRow, ProjectRow, StatsReport};
use crate::{
    AddArgs, Command, LabelCommand, LsArgs, OutputFormat, ProjectCommand, SelectCommand,
    SubtaskCommand, UpdateArgs,
};

/// Everything a command needs: the persisted service and the loaded configuration.
pub struct Session<S> {
    service: FlowService<S>,
    config: FlowConfig,
}

impl<S: StateStore> Session<S> {
    pub const fn new(service: FlowService<S>, config: FlowConfig) -> Self {
        Self { service, config }
    }

    fn offset(&self) -> UtcOffset {
        self.service.now().offset()
    }
}

pub fn run<S: StateStore, W: Write>(
    command: Command,
    session: &mut Session<S>,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Seed { force } => handle_seed(session, force, out),
        Command::Add(args) => handle_add(session, args, out),
        Command::Update(args) => handle_update(session, args, out),
        Command::Done { task } => handle_done(session, &task, out),
        Command::Rm { task } => {
            let id: TaskId = parse_id("task id", &task)?;
            session.service.apply(|store| store.delete_task(&id))?;
            writeln!(out, "deleted task: {id}")?;
            Ok(())
        }
        Command::Show { task, format } => handle_show(session, &task, format, out),
        Command::Ls(args) => handle_ls(session, &args, out),
        Command::Stats { format } => handle_stats(session, format, out),
        Command::Subtask(command) => run_subtask(session, command, out),
        Command::Comment {
            task,
            message,
            author_id,
            author_name,
        } => handle_comment(
            session,
            &task,
            &message,
            author_id.as_deref(),
            author_name.as_deref(),
            out,
        ),
        Command::Project(command) => run_project(session, command, out),
        Command::Label(command) => run_label(session, command, out),
        Command::Reorder { tasks } => handle_reorder(session, &tasks, out),
        Command::Select(command) => run_select(session, command, out),
    }
}

fn handle_seed<S: StateStore, W: Write>(
    session: &mut Session<S>,
    force: bool,
    out: &mut W,
) -> Result<()> {
    if !force && !session.service.state().tasks.is_empty() {
        bail!("workspace already has tasks; pass --force to replace it");
    }
    let state = sample_state(session.service.now()).context("failed to build sample data")?;
    let summary = (state.tasks.len(), state.projects.len(), state.labels.len());
    session.service.reset(state)?;
    writeln!(
        out,
        "seeded {} tasks, {} projects, {} labels",
        summary.0, summary.1, summary.2
    )?;
    Ok(())
}

fn handle_add<S: StateStore, W: Write>(
    session: &mut Session<S>,
    args: AddArgs,
    out: &mut W,
) -> Result<()> {
    let AddArgs {
        title,
        description,
        status,
        priority,
        project,
        labels,
        due,
        estimate,
    } = args;

    let title = non_blank("title", &title)?;
    let project = project
        .as_deref()
        .map(|raw| parse_id::<ProjectId>("project id", raw))
        .transpose()?
        .unwrap_or_else(ProjectId::inbox);
    let labels = labels
        .iter()
        .map(|raw| parse_id::<LabelId>("label id", raw))
        .collect::<Result<BTreeSet<_>>>()?;

    let state = session.service.state();
    let default_priority = ensure_project(&state, &project)?.settings.default_priority;
    ensure_labels(&state, &labels)?;

    let author = resolve_author(None, None, &session.config.author);
    let mut draft = TaskDraft::new(title, project, author.id);
    draft.description = description.filter(|text| !text.trim().is_empty());
    draft.status = status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?
        .unwrap_or_default();
    draft.priority = priority
        .as_deref()
        .map(str::parse::<Priority>)
        .transpose()?
        .unwrap_or(default_priority);
    draft.labels = labels;
    draft.due_date = due
        .as_deref()
        .map(|raw| parse_instant("due", raw, session.offset(), Time::MIDNIGHT))
        .transpose()?;
    draft.estimated_minutes = estimate;

    let id = session.service.apply(|store| Ok(store.add_task(draft)))?;
    writeln!(out, "created task: {id}")?;
    Ok(())
}

fn handle_update<S: StateStore, W: Write>(
    session: &mut Session<S>,
    args: UpdateArgs,
    out: &mut W,
) -> Result<()> {
    let id: TaskId = parse_id("task id", &args.task)?;
    let state = session.service.state();
    if let Some(raw) = &args.project {
        ensure_project(&state, &parse_id("project id", raw)?)?;
    }
    let added = args
        .add_labels
        .iter()
        .map(|raw| parse_id::<LabelId>("label id", raw))
        .collect::<Result<BTreeSet<_>>>()?;
    ensure_labels(&state, &added)?;

    let offset = session.offset();
    if session.service.edit_task(&id, task_edit(args), offset)? {
        writeln!(out, "updated task: {id}")?;
    } else {
        writeln!(out, "no changes for task: {id}")?;
    }
    Ok(())
}

fn patch<T>(value: Option<T>, clear: bool) -> Option<FieldPatch<T>> {
    if clear {
        Some(FieldPatch::Clear)
    } else {
        value.map(FieldPatch::Set)
    }
}

fn task_edit(args: UpdateArgs) -> TaskEdit {
    let UpdateArgs {
        task: _,
        title,
        description,
        clear_description,
        status,
        priority,
        project,
        add_labels,
        remove_labels,
        due,
        clear_due,
        estimate,
        clear_estimate,
        archive,
        unarchive,
    } = args;
    TaskEdit {
        title,
        description: patch(description, clear_description),
        status,
        priority,
        project,
        add_labels,
        remove_labels,
        due: patch(due, clear_due),
        estimate: patch(estimate, clear_estimate),
        archived: if archive {
            Some(true)
        } else if unarchive {
            Some(false)
        } else {
            None
        },
    }
}

fn handle_done<S: StateStore, W: Write>(
    session: &mut Session<S>,
    task: &str,
    out: &mut W,
) -> Result<()> {
    let id: TaskId = parse_id("task id", task)?;
    session
        .service
        .apply(|store| store.toggle_task_completion(&id))?;
    let state = session.service.state();
    let status = state.task(&id).map(|task| task.status).unwrap_or_default();
    writeln!(out, "task {id} is now {status}")?;
    Ok(())
}

fn handle_show<S: StateStore, W: Write>(
    session: &Session<S>,
    task: &str,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let id: TaskId = parse_id("task id", task)?;
    let state = session.service.state();
    let task = state
        .task(&id)
        .ok_or_else(|| DispatchError::NotFound(EntityRef::Task(id.clone())))?;
    match format {
        OutputFormat::Table => render::task_detail(out, &state, task)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(task)?)?,
    }
    Ok(())
}

fn build_filter(
    args: &LsArgs,
    offset: UtcOffset,
    base: &TaskFilter,
) -> Result<TaskFilter, FilterBuildError> {
    let builder = TaskFilterBuilder::new()
        .with_offset(offset)
        .with_statuses(&args.statuses)?
        .with_priorities(&args.priorities)?
        .with_project(args.project.as_deref())?
        .with_labels(&args.labels)?
        .with_due_range(args.due_from.as_deref(), args.due_until.as_deref())?
        .with_text(args.text.clone())
        .show_completed(args.hide_completed.then_some(false))
        .show_archived(args.archived.then_some(true));
    Ok(builder.build_on(base))
}

fn has_filter_flags(args: &LsArgs) -> bool {
    !args.statuses.is_empty()
        || !args.priorities.is_empty()
        || args.project.is_some()
        || !args.labels.is_empty()
        || args.due_from.is_some()
        || args.due_until.is_some()
        || args.text.is_some()
        || args.hide_completed
        || args.archived
}

/// The saved view is the base; `[view]` config stands in while the snapshot
/// still holds the default view. Filter flags replace the saved predicates.
fn handle_ls<S: StateStore, W: Write>(
    session: &mut Session<S>,
    args: &LsArgs,
    out: &mut W,
) -> Result<()> {
    let state = session.service.state();
    let config = &session.config.view;
    let base_filter = if state.filter == TaskFilter::default() {
        config.filter()
    } else {
        state.filter.clone()
    };
    let base_sort = if state.sort == TaskSort::default() {
        config.sort()
    } else {
        state.sort
    };

    let filter = if has_filter_flags(args) {
        build_filter(args, session.offset(), &base_filter)
            .map_err(|err| anyhow!(err.describe_user_facing()))?
    } else {
        base_filter
    };
    let sort = parse_sort(args.sort.as_deref(), args.direction.as_deref(), base_sort)
        .map_err(|err| anyhow!(err.describe_user_facing()))?;
    let search_query = args
        .search
        .clone()
        .unwrap_or_else(|| state.search_query.clone());

    let view = if args.save {
        session.service.apply(|store| {
            store.set_filter(filter);
            store.set_sort(sort);
            store.set_search_query(search_query);
            Ok(())
        })?;
        TaskState::clone(&session.service.state())
    } else {
        TaskState {
            filter,
            sort,
            search_query,
            ..TaskState::clone(&state)
        }
    };

    let tasks = view.visible_tasks();
    if tasks.is_empty() {
        if view.effective_filter().is_empty() {
            writeln!(out, "No tasks found")?;
        } else {
            writeln!(out, "No tasks matched the provided filters")?;
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => render::task_table(out, &view, &tasks)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&tasks)?)?,
    }
    Ok(())
}

fn handle_stats<S: StateStore, W: Write>(
    session: &Session<S>,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let state = session.service.state();
    let report = StatsReport {
        stats: session.service.stats(),
        projects: state
            .projects
            .iter()
            .filter(|project| !project.archived)
            .map(|project| state.project_progress(&project.id))
            .collect(),
    };
    match format {
        OutputFormat::Table => render::stats(out, &report, &state)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
    }
    Ok(())
}

fn run_subtask<S: StateStore, W: Write>(
    session: &mut Session<S>,
    command: SubtaskCommand,
    out: &mut W,
) -> Result<()> {
    match command {
        SubtaskCommand::Add { task, title } => {
            let task: TaskId = parse_id("task id", &task)?;
            let title = non_blank("subtask title", &title)?;
            let id = session
                .service
                .apply(|store| store.add_subtask(&task, title))?;
            writeln!(out, "added subtask: {id}")?;
        }
        SubtaskCommand::Toggle { task, subtask } => {
            let task: TaskId = parse_id("task id", &task)?;
            let subtask: SubtaskId = parse_id("subtask id", &subtask)?;
            session
                .service
                .apply(|store| store.toggle_subtask(&task, &subtask))?;
            let state = session.service.state();
            let completed = state
                .task(&task)
                .and_then(|task| task.subtask(&subtask))
                .is_some_and(|subtask| subtask.completed);
            let status = if completed { "done" } else { "open" };
            writeln!(out, "subtask {subtask} is now {status}")?;
        }
        SubtaskCommand::Rename {
            task,
            subtask,
            title,
        } => {
            let task: TaskId = parse_id("task id", &task)?;
            let subtask: SubtaskId = parse_id("subtask id", &subtask)?;
            let update = SubtaskUpdate {
                title: Some(non_blank("subtask title", &title)?.to_owned()),
                completed: None,
            };
            session
                .service
                .apply(|store| store.update_subtask(&task, &subtask, update))?;
            writeln!(out, "renamed subtask: {subtask}")?;
        }
        SubtaskCommand::Rm { task, subtask } => {
            let task: TaskId = parse_id("task id", &task)?;
            let subtask: SubtaskId = parse_id("subtask id", &subtask)?;
            session
                .service
                .apply(|store| store.delete_subtask(&task, &subtask))?;
            writeln!(out, "deleted subtask: {subtask}")?;
        }
    }
    Ok(())
}

fn handle_comment<S: StateStore, W: Write>(
    session: &mut Session<S>,
    task: &str,
    message: &str,
    author_id: Option<&str>,
    author_name: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let task: TaskId = parse_id("task id", task)?;
    let message = non_blank("comment", message)?;
    let author = resolve_author(author_id, author_name, &session.config.author);
    let id = session
        .service
        .apply(|store| store.add_comment(&task, author, message))?;
    writeln!(out, "commented: {task} ({id})")?;
    Ok(())
}

fn run_project<S: StateStore, W: Write>(
    session: &mut Session<S>,
    command: ProjectCommand,
    out: &mut W,
) -> Result<()> {
    match command {
        ProjectCommand::Add {
            name,
            description,
            color,
            icon,
            favorite,
        } => {
            let author = resolve_author(None, None, &session.config.author);
            let draft = ProjectDraft {
                name: non_blank("project name", &name)?.to_owned(),
                description,
                color,
                icon,
                owner_id: author.id,
                member_ids: Vec::new(),
                favorite,
                settings: ProjectSettings::default(),
            };
            let id = session.service.apply(|store| Ok(store.add_project(draft)))?;
            writeln!(out, "created project: {id}")?;
        }
        ProjectCommand::Update {
            project,
            name,
            description,
            color,
            icon,
            favorite,
            archived,
        } => {
            let id: ProjectId = parse_id("project id", &project)?;
            let update = ProjectUpdate {
                name,
                description: description.map(Some),
                color,
                icon: icon.map(Some),
                favorite,
                archived,
                ..ProjectUpdate::default()
            };
            session
                .service
                .apply(|store| store.update_project(&id, update))?;
            writeln!(out, "updated project: {id}")?;
        }
        ProjectCommand::Rm { project } => {
            let id: ProjectId = parse_id("project id", &project)?;
            let moved = session.service.state().tasks_by_project(&id).len();
            session.service.apply(|store| store.delete_project(&id))?;
            writeln!(out, "deleted project: {id} ({moved} tasks moved to the inbox)")?;
        }
        ProjectCommand::Ls { format } => {
            let state = session.service.state();
            let rows: Vec<ProjectRow<'_>> = state
                .projects
                .iter()
                .map(|project| ProjectRow {
                    project,
                    progress: state.project_progress(&project.id),
                })
                .collect();
            match format {
                OutputFormat::Table => render::project_table(out, &rows)?,
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?,
            }
        }
    }
    Ok(())
}

fn run_label<S: StateStore, W: Write>(
    session: &mut Session<S>,
    command: LabelCommand,
    out: &mut W,
) -> Result<()> {
    match command {
        LabelCommand::Add {
            name,
            color,
            description,
        } => {
            let draft = LabelDraft {
                name: non_blank("label name", &name)?.to_owned(),
                color,
                description,
            };
            let id = session.service.apply(|store| Ok(store.add_label(draft)))?;
            writeln!(out, "created label: {id}")?;
        }
        LabelCommand::Update {
            label,
            name,
            color,
            description,
        } => {
            let id: LabelId = parse_id("label id", &label)?;
            let update = LabelUpdate {
                name,
                color,
                description: description.map(Some),
            };
            session
                .service
                .apply(|store| store.update_label(&id, update))?;
            writeln!(out, "updated label: {id}")?;
        }
        LabelCommand::Rm { label } => {
            let id: LabelId = parse_id("label id", &label)?;
            let detached = label_usage(&session.service.state(), &id);
            session.service.apply(|store| store.delete_label(&id))?;
            writeln!(out, "deleted label: {id} (detached from {detached} tasks)")?;
        }
        LabelCommand::Ls { format } => {
            let state = session.service.state();
            let rows: Vec<LabelRow<'_>> = state
                .labels
                .iter()
                .map(|label| LabelRow {
                    label,
                    tasks: label_usage(&state, &label.id),
                })
                .collect();
            match format {
                OutputFormat::Table => render::label_table(out, &rows)?,
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?,
            }
        }
    }
    Ok(())
}

fn handle_reorder<S: StateStore, W: Write>(
    session: &mut Session<S>,
    tasks: &[String],
    out: &mut W,
) -> Result<()> {
    let ids = tasks
        .iter()
        .map(|raw| parse_id::<TaskId>("task id", raw))
        .collect::<Result<Vec<_>>>()?;
    let state = session.service.state();
    let known = ids.iter().filter(|id| state.task(id).is_some()).count();
    if known < ids.len() {
        tracing::warn!(ignored = ids.len() - known, "unknown task ids ignored by reorder");
    }
    session.service.apply(|store| {
        store.reorder_tasks(ids);
        Ok(())
    })?;
    writeln!(out, "reordered {known} tasks")?;
    Ok(())
}

fn run_select<S: StateStore, W: Write>(
    session: &mut Session<S>,
    command: SelectCommand,
    out: &mut W,
) -> Result<()> {
    match command {
        SelectCommand::Task { task } => {
            let id = task
                .as_deref()
                .map(|raw| parse_id::<TaskId>("task id", raw))
                .transpose()?;
            session
                .service
                .apply(|store| store.select_task(id.as_ref()))?;
            match id {
                Some(id) => writeln!(out, "selected task: {id}")?,
                None => writeln!(out, "cleared task selection")?,
            }
        }
        SelectCommand::Project { project } => {
            let id = project
                .as_deref()
                .map(|raw| parse_id::<ProjectId>("project id", raw))
                .transpose()?;
            session
                .service
                .apply(|store| store.select_project(id.as_ref()))?;
            match id {
                Some(id) => writeln!(out, "selected project: {id}")?,
                None => writeln!(out, "cleared project selection")?,
            }
        }
    }
    Ok(())
}

fn label_usage(state: &TaskState, label: &LabelId) -> usize {
    state
        .tasks
        .iter()
        .filter(|task| task.labels.contains(label))
        .count()
}

fn ensure_project<'a>(
    state: &'a TaskState,
    project: &ProjectId,
) -> Result<&'a Project> {
    state
        .project(project)
        .ok_or_else(|| DispatchError::NotFound(EntityRef::Project(project.clone())).into())
}

fn ensure_labels(state: &TaskState, labels: &BTreeSet<LabelId>) -> Result<()> {
    if let Some(missing) = labels.iter().find(|label| state.label(label).is_none()) {
        return Err(DispatchError::NotFound(EntityRef::Label(missing.clone())).into());
    }
    Ok(())
}

fn non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{field} must not be empty");
    }
    Ok(trimmed)
}

fn parse_id<T: FromStr<Err = IdError>>(field: &str, raw: &str) -> Result<T> {
    raw.parse()
        .with_context(|| format!("invalid {field}: {raw:?}"))
}
