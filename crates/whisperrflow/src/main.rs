//! CLI entry point for whisperrflow.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Tasks, projects and labels kept in a local JSON snapshot.
#[derive(Parser, Debug)]
#[command(
    name = "whisperrflow",
    version,
    about = "whisperrflow: a task, project and label manager"
)]
struct Cli {
    /// Snapshot file (defaults to `[storage] data_file` or the user data directory).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Configuration file (defaults to `.whisperrflow/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the workspace with demo data.
    Seed {
        /// Overwrite a workspace that already has tasks.
        #[arg(long)]
        force: bool,
    },

    /// Create a new task.
    Add(AddArgs),

    /// Change fields of an existing task.
    Update(UpdateArgs),

    /// Toggle a task between done and todo.
    Done { task: String },

    /// Delete a task.
    Rm { task: String },

    /// Show one task with its subtasks and comments.
    Show {
        task: String,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List tasks through a filter and sort.
    Ls(LsArgs),

    /// Dashboard statistics.
    Stats {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Manage subtasks.
    #[command(subcommand)]
    Subtask(SubtaskCommand),

    /// Add a comment to a task.
    Comment {
        task: String,
        message: String,
        #[arg(long)]
        author_id: Option<String>,
        #[arg(long)]
        author_name: Option<String>,
    },

    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage labels.
    #[command(subcommand)]
    Label(LabelCommand),

    /// Assign manual positions from the given task order.
    Reorder {
        #[arg(required = true)]
        tasks: Vec<String>,
    },

    /// Select a task or project; omit the id to clear the selection.
    #[command(subcommand)]
    Select(SelectCommand),
}

#[derive(Args, Debug)]
struct AddArgs {
    title: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    /// Project id (defaults to the inbox).
    #[arg(long)]
    project: Option<String>,
    #[arg(short = 'l', long = "label")]
    labels: Vec<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    #[arg(long)]
    due: Option<String>,
    /// Estimated minutes.
    #[arg(long)]
    estimate: Option<u32>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    task: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,
    #[arg(long)]
    clear_description: bool,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    #[arg(long)]
    project: Option<String>,
    #[arg(long = "add-label")]
    add_labels: Vec<String>,
    #[arg(long = "remove-label")]
    remove_labels: Vec<String>,
    #[arg(long, conflicts_with = "clear_due")]
    due: Option<String>,
    #[arg(long)]
    clear_due: bool,
    #[arg(long, conflicts_with = "clear_estimate")]
    estimate: Option<u32>,
    #[arg(long)]
    clear_estimate: bool,
    #[arg(long, conflicts_with = "unarchive")]
    archive: bool,
    #[arg(long)]
    unarchive: bool,
}

#[derive(Args, Debug, Default)]
struct LsArgs {
    #[arg(short = 's', long = "status")]
    statuses: Vec<String>,
    #[arg(short = 'p', long = "priority")]
    priorities: Vec<String>,
    #[arg(long)]
    project: Option<String>,
    #[arg(short = 'l', long = "label")]
    labels: Vec<String>,
    #[arg(long)]
    due_from: Option<String>,
    #[arg(long)]
    due_until: Option<String>,
    #[arg(long)]
    text: Option<String>,
    /// Search title and description; an empty value clears the saved query.
    #[arg(long)]
    search: Option<String>,
    /// Hide completed tasks.
    #[arg(long)]
    hide_completed: bool,
    /// Include archived tasks.
    #[arg(long)]
    archived: bool,
    /// due-date, priority, created-at, updated-at, title, status or position.
    #[arg(long)]
    sort: Option<String>,
    /// asc or desc.
    #[arg(long)]
    direction: Option<String>,
    /// Store the filter, sort and search as the workspace view.
    #[arg(long)]
    save: bool,
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum SubtaskCommand {
    /// Append a subtask.
    Add { task: String, title: String },
    /// Flip a subtask's completion flag.
    Toggle { task: String, subtask: String },
    /// Rename a subtask.
    Rename {
        task: String,
        subtask: String,
        title: String,
    },
    /// Delete a subtask.
    Rm { task: String, subtask: String },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    /// Create a project.
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "#6366f1")]
        color: String,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        favorite: bool,
    },
    /// Change project fields.
    Update {
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        favorite: Option<bool>,
        #[arg(long)]
        archived: Option<bool>,
    },
    /// Delete a project, moving its tasks to the inbox.
    Rm { project: String },
    /// List projects with their progress.
    Ls {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[derive(Subcommand, Debug)]
enum LabelCommand {
    /// Create a label.
    Add {
        name: String,
        #[arg(long, default_value = "#3b82f6")]
        color: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change label fields.
    Update {
        label: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a label and detach it from every task.
    Rm { label: String },
    /// List labels with usage counts.
    Ls {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[derive(Subcommand, Debug)]
enum SelectCommand {
    /// Select a task.
    Task { task: Option<String> },
    /// Select a project.
    Project { project: Option<String> },
}

fn main() -> Result<()> {
    let Cli { data, config, cmd } = Cli::parse();
    install_tracing();
    commands::execute(data, config, cmd)
}

fn install_tracing() {
    // RUST_LOG overrides the default; command output stays on stdout.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
