//! Demo workspace used by `whisperrflow seed`.

use std::str::FromStr;

use time::{Duration, OffsetDateTime};
use whisperrflow_core::{
    Author, Comment, IdError, Label, Priority, Project, ProjectSettings, Subtask, Task, TaskState,
    TaskStatus, UserId,
};

/// Owner of every sample project.
pub const SAMPLE_OWNER: &str = "user-1";

#[derive(Clone, Copy)]
enum Day {
    Yesterday,
    Today,
    Tomorrow,
    NextWeek,
}

impl Day {
    fn at(self, now: OffsetDateTime) -> OffsetDateTime {
        match self {
            Self::Yesterday => now - Duration::days(1),
            Self::Today => now,
            Self::Tomorrow => now + Duration::days(1),
            Self::NextWeek => now + Duration::days(7),
        }
    }
}

struct ProjectSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    color: &'static str,
    icon: &'static str,
    members: &'static [&'static str],
    favorite: bool,
    settings: ProjectSettings,
}

struct CommentSeed {
    id: &'static str,
    content: &'static str,
    author_id: &'static str,
    author_name: &'static str,
    created: Day,
}

struct TaskSeed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    status: TaskStatus,
    priority: Priority,
    project: &'static str,
    labels: &'static [&'static str],
    subtasks: &'static [(&'static str, &'static str, bool)],
    comments: &'static [CommentSeed],
    assignees: &'static [&'static str],
    creator: &'static str,
    due: Option<Day>,
    start: Option<Day>,
    estimate: Option<u32>,
    created: Day,
    position: i64,
}

const LABELS: [(&str, &str, &str, &str); 6] = [
    ("label-1", "Bug", "#ef4444", "Bug fixes and issues"),
    ("label-2", "Feature", "#10b981", "New features"),
    ("label-3", "Enhancement", "#3b82f6", "Improvements"),
    ("label-4", "Documentation", "#8b5cf6", "Docs updates"),
    ("label-5", "Urgent", "#f59e0b", "Needs immediate attention"),
    ("label-6", "Research", "#ec4899", "Research tasks"),
];

const fn settings(
    default_priority: Priority,
    allow_time_tracking: bool,
    allow_recurrence: bool,
    show_completed_tasks: bool,
) -> ProjectSettings {
    ProjectSettings {
        default_priority,
        allow_subtasks: true,
        allow_time_tracking,
        allow_recurrence,
        show_completed_tasks,
    }
}

const PROJECTS: [ProjectSeed; 3] = [
    ProjectSeed {
        id: "project-1",
        name: "Whisperr Ecosystem",
        description: "Main development project for all Whisperr apps",
        color: "#10b981",
        icon: "rocket",
        members: &["user-2", "user-3"],
        favorite: true,
        settings: settings(Priority::Medium, true, true, true),
    },
    ProjectSeed {
        id: "project-2",
        name: "Personal",
        description: "Personal tasks and goals",
        color: "#ec4899",
        icon: "person",
        members: &[],
        favorite: false,
        settings: settings(Priority::Low, false, true, false),
    },
    ProjectSeed {
        id: "project-3",
        name: "Learning",
        description: "Courses, tutorials, and skill development",
        color: "#f59e0b",
        icon: "school",
        members: &[],
        favorite: true,
        settings: settings(Priority::Medium, true, false, true),
    },
];

const TASKS: [TaskSeed; 10] = [
    TaskSeed {
        id: "task-1",
        title: "Design WhisperrFlow dashboard",
        description: "Create the main dashboard layout with widgets for task overview, upcoming deadlines, and productivity stats.",
        status: TaskStatus::InProgress,
        priority: Priority::High,
        project: "project-1",
        labels: &["label-2", "label-3"],
        subtasks: &[
            ("st-1", "Create wireframes", true),
            ("st-2", "Design component library", true),
            ("st-3", "Implement responsive layout", false),
            ("st-4", "Add dark mode support", false),
        ],
        comments: &[CommentSeed {
            id: "comment-1",
            content: "Looking great so far! The color scheme is perfect.",
            author_id: "user-2",
            author_name: "Sarah Chen",
            created: Day::Yesterday,
        }],
        assignees: &["user-1"],
        creator: "user-1",
        due: Some(Day::NextWeek),
        start: Some(Day::Today),
        estimate: Some(480),
        created: Day::Today,
        position: 0,
    },
    TaskSeed {
        id: "task-2",
        title: "Implement task filtering and sorting",
        description: "Add ability to filter tasks by status, priority, labels, and due date. Include sorting options.",
        status: TaskStatus::Todo,
        priority: Priority::High,
        project: "project-1",
        labels: &["label-2"],
        subtasks: &[],
        comments: &[],
        assignees: &["user-1"],
        creator: "user-1",
        due: Some(Day::Tomorrow),
        start: None,
        estimate: None,
        created: Day::Today,
        position: 1,
    },
    TaskSeed {
        id: "task-3",
        title: "Fix login authentication bug",
        description: "Users are getting logged out unexpectedly after 5 minutes. Need to investigate token refresh.",
        status: TaskStatus::Todo,
        priority: Priority::Urgent,
        project: "project-1",
        labels: &["label-1", "label-5"],
        subtasks: &[],
        comments: &[],
        assignees: &["user-1", "user-3"],
        creator: "user-2",
        due: Some(Day::Today),
        start: None,
        estimate: None,
        created: Day::Yesterday,
        position: 2,
    },
    TaskSeed {
        id: "task-4",
        title: "Write API documentation",
        description: "Document all REST API endpoints with examples and response schemas.",
        status: TaskStatus::Todo,
        priority: Priority::Medium,
        project: "project-1",
        labels: &["label-4"],
        subtasks: &[],
        comments: &[],
        assignees: &["user-1"],
        creator: "user-1",
        due: Some(Day::NextWeek),
        start: None,
        estimate: None,
        created: Day::Today,
        position: 3,
    },
    TaskSeed {
        id: "task-5",
        title: "Plan weekend hiking trip",
        description: "Research trails, check weather, pack essentials.",
        status: TaskStatus::Todo,
        priority: Priority::Low,
        project: "project-2",
        labels: &[],
        subtasks: &[
            ("st-5", "Choose trail", true),
            ("st-6", "Check weather forecast", false),
            ("st-7", "Pack gear", false),
        ],
        comments: &[],
        assignees: &["user-1"],
        creator: "user-1",
        due: Some(Day::NextWeek),
        start: None,
        estimate: None,
        created: Day::Today,
        position: 0,
    },
    TaskSeed {
        id: "task-6",
        title: "Complete React course",
        description: "Finish the advanced React patterns course on Udemy.",
        status: TaskStatus::InProgress,
        priority: Priority::Medium,
        project: "project-3",
        labels: &["label-6"],
        subtasks: &[
            ("st-8", "Module 1: Hooks Deep Dive", true),
            ("st-9", "Module 2: Context API", true),
            ("st-10", "Module 3: Performance", false),
            ("st-11", "Module 4: Testing", false),
        ],
        comments: &[],
        assignees: &["user-1"],
        creator: "user-1",
        due: Some(Day::NextWeek),
        start: None,
        estimate: Some(600),
        created: Day::Yesterday,
        position: 0,
    },
    TaskSeed {
        id: "task-7",
        title: "Review pull request #42",
        description: "Review and provide feedback on the new notification system implementation.",
        status: TaskStatus::Blocked,
        priority: Priority::Medium,
        project: "project-1",
        labels: &["label-3"],
        subtasks: &[],
        comments: &[CommentSeed {
            id: "comment-2",
            content: "Waiting for the author to address the previous comments.",
            author_id: "user-1",
            author_name: "You",
            created: Day::Today,
        }],
        assignees: &["user-1"],
        creator: "user-2",
        due: None,
        start: None,
        estimate: None,
        created: Day::Yesterday,
        position: 4,
    },
    TaskSeed {
        id: "task-8",
        title: "Set up CI/CD pipeline",
        description: "Configure GitHub Actions for automated testing and deployment.",
        status: TaskStatus::Done,
        priority: Priority::High,
        project: "project-1",
        labels: &["label-2"],
        subtasks: &[],
        comments: &[],
        assignees: &["user-1"],
        creator: "user-1",
        due: None,
        start: None,
        estimate: None,
        created: Day::Yesterday,
        position: 5,
    },
    TaskSeed {
        id: "task-9",
        title: "Buy groceries",
        description: "Milk, eggs, bread, vegetables, fruits",
        status: TaskStatus::Todo,
        priority: Priority::Low,
        project: "project-2",
        labels: &[],
        subtasks: &[],
        comments: &[],
        assignees: &["user-1"],
        creator: "user-1",
        due: Some(Day::Tomorrow),
        start: None,
        estimate: None,
        created: Day::Today,
        position: 1,
    },
    TaskSeed {
        id: "task-10",
        title: "Research TypeScript 5.0 features",
        description: "Explore new decorators, const type parameters, and other improvements.",
        status: TaskStatus::Todo,
        priority: Priority::Low,
        project: "project-3",
        labels: &["label-6"],
        subtasks: &[],
        comments: &[],
        assignees: &["user-1"],
        creator: "user-1",
        due: None,
        start: None,
        estimate: None,
        created: Day::Today,
        position: 1,
    },
];

fn id<T: FromStr<Err = IdError>>(raw: &str) -> Result<T, IdError> {
    raw.parse()
}

fn ids<T: FromStr<Err = IdError>>(raw: &[&str]) -> Result<Vec<T>, IdError> {
    raw.iter().map(|value| id(value)).collect()
}

/// Build the demo workspace: the inbox, three projects, six labels and ten
/// tasks, with dates placed relative to `now`.
///
/// # Errors
/// Only fails if a built-in identifier is blank.
pub fn sample_state(now: OffsetDateTime) -> Result<TaskState, IdError> {
    let owner: UserId = id(SAMPLE_OWNER)?;

    let mut projects = vec![Project::inbox(owner.clone(), now)];
    for (position, seed) in (1..).zip(&PROJECTS) {
        projects.push(Project {
            id: id(seed.id)?,
            name: seed.name.to_owned(),
            description: Some(seed.description.to_owned()),
            color: seed.color.to_owned(),
            icon: Some(seed.icon.to_owned()),
            owner_id: owner.clone(),
            member_ids: ids(seed.members)?,
            favorite: seed.favorite,
            archived: false,
            created_at: now,
            updated_at: now,
            position,
            settings: seed.settings.clone(),
        });
    }

    let labels = LABELS
        .iter()
        .map(|(label_id, name, color, description)| {
            Ok(Label {
                id: id(label_id)?,
                name: (*name).to_owned(),
                color: (*color).to_owned(),
                description: Some((*description).to_owned()),
            })
        })
        .collect::<Result<Vec<_>, IdError>>()?;

    let tasks = TASKS
        .iter()
        .map(|seed| build_task(seed, now))
        .collect::<Result<Vec<_>, IdError>>()?;

    Ok(TaskState {
        tasks,
        projects,
        labels,
        ..TaskState::new(owner, now)
    })
}

fn build_task(seed: &TaskSeed, now: OffsetDateTime) -> Result<Task, IdError> {
    let created_at = seed.created.at(now);
    let done = seed.status.is_done();
    let subtasks = seed
        .subtasks
        .iter()
        .map(|(subtask_id, title, completed)| {
            Ok(Subtask {
                id: id(subtask_id)?,
                title: (*title).to_owned(),
                completed: *completed,
                created_at: now,
                completed_at: completed.then_some(now),
            })
        })
        .collect::<Result<Vec<_>, IdError>>()?;
    let comments = seed
        .comments
        .iter()
        .map(|comment| {
            Ok(Comment {
                id: id(comment.id)?,
                content: comment.content.to_owned(),
                author: Author {
                    id: id(comment.author_id)?,
                    name: comment.author_name.to_owned(),
                },
                created_at: comment.created.at(now),
            })
        })
        .collect::<Result<Vec<_>, IdError>>()?;

    Ok(Task {
        id: id(seed.id)?,
        title: seed.title.to_owned(),
        description: Some(seed.description.to_owned()),
        status: seed.status,
        priority: seed.priority,
        project_id: id(seed.project)?,
        labels: ids(seed.labels)?.into_iter().collect(),
        subtasks,
        comments,
        attachments: Vec::new(),
        assignee_ids: ids(seed.assignees)?,
        creator_id: id(seed.creator)?,
        due_date: seed.due.map(|day| day.at(now)),
        start_date: seed.start.map(|day| day.at(now)),
        estimated_minutes: seed.estimate,
        created_at,
        // Finished work was last touched when it was completed.
        updated_at: if done { created_at } else { now },
        completed_at: done.then_some(created_at),
        archived: false,
        position: seed.position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use whisperrflow_core::{LabelId, ProjectId, TaskId};

    const NOW: OffsetDateTime = datetime!(2025-06-02 09:00 UTC);

    fn state() -> TaskState {
        sample_state(NOW).unwrap_or_else(|err| panic!("sample must build: {err}"))
    }

    #[test]
    fn sample_has_expected_shape() {
        let state = state();
        assert_eq!(state.projects.len(), 4);
        assert!(state.projects[0].id.is_inbox());
        assert_eq!(state.labels.len(), 6);
        assert_eq!(state.tasks.len(), 10);
        assert!(state.filter.show_completed);
        assert!(!state.filter.show_archived);
    }

    #[test]
    fn every_reference_resolves() {
        let state = state();
        for task in &state.tasks {
            assert!(state.project(&task.project_id).is_some(), "{}", task.id);
            for label in &task.labels {
                assert!(state.label(label).is_some(), "{label}");
            }
        }
    }

    #[test]
    fn dates_follow_now() {
        let state = state();
        let task = |raw: &str| {
            let task_id: TaskId = id(raw).unwrap_or_else(|err| panic!("{err}"));
            state
                .task(&task_id)
                .cloned()
                .unwrap_or_else(|| panic!("{raw} must exist"))
        };
        assert_eq!(task("task-2").due_date, Some(datetime!(2025-06-03 09:00 UTC)));
        assert_eq!(task("task-3").created_at, datetime!(2025-06-01 09:00 UTC));

        let finished = task("task-8");
        assert_eq!(finished.status, TaskStatus::Done);
        assert_eq!(finished.completed_at, Some(datetime!(2025-06-01 09:00 UTC)));
        assert_eq!(task("task-1").subtask_progress(), (2, 4));
    }

    #[test]
    fn stats_match_the_seed() {
        let state = state();
        let stats = state.stats(NOW);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.due_tomorrow, 2);
        assert_eq!(stats.in_progress, 2);
        assert_eq!(stats.urgent, 1);
        assert_eq!(stats.completion_rate, 10);

        let project: ProjectId = id("project-1").unwrap_or_else(|err| panic!("{err}"));
        let progress = state.project_progress(&project);
        assert_eq!((progress.total, progress.completed), (6, 1));

        let label: LabelId = id("label-6").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(
            state.tasks.iter().filter(|task| task.labels.contains(&label)).count(),
            2
        );
    }
}
