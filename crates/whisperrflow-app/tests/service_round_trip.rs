//! Integration tests for `FlowService` backed by the JSON snapshot store.
//!
//! Every mutation goes through the service, is written to disk, and must be
//! visible to a second service opened on the same file.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use time::macros::datetime;
use whisperrflow_app::{
    FieldPatch, FixedClock, FlowService, JsonFileStore, StateStore, TaskEdit, sample_state,
};
use whisperrflow_core::{ProjectId, TaskDraft, TaskId, TaskStatus, UserId};

fn snapshot_path(dir: &TempDir) -> PathBuf {
    dir.path().join("data").join("state.json")
}

fn open(dir: &TempDir) -> FlowService<JsonFileStore> {
    let clock = Arc::new(FixedClock::new(datetime!(2025-06-02 09:00 UTC)));
    let store = JsonFileStore::new(snapshot_path(dir));
    FlowService::open(store, clock, "user-1".parse::<UserId>().unwrap()).expect("open service")
}

#[test]
fn fresh_workspace_has_only_the_inbox() {
    let dir = TempDir::with_prefix("whisperrflow-service-").expect("create temp dir");
    let service = open(&dir);

    let state = service.state();
    assert!(state.tasks.is_empty());
    assert_eq!(state.projects.len(), 1);
    assert!(state.projects[0].id.is_inbox());
    assert!(!dir.path().join("data").exists(), "nothing is written before a change");
}

#[test]
fn mutations_survive_reopen() {
    let dir = TempDir::with_prefix("whisperrflow-service-").expect("create temp dir");
    let mut service = open(&dir);

    let owner: UserId = "user-1".parse().unwrap();
    let id = service
        .apply(|store| Ok(store.add_task(TaskDraft::new("Write notes", ProjectId::inbox(), owner))))
        .expect("add task");
    service
        .apply(|store| store.add_subtask(&id, "Outline"))
        .expect("add subtask");
    let edited = service
        .edit_task(
            &id,
            TaskEdit {
                status: Some("in-progress".into()),
                due: Some(FieldPatch::Set("2025-06-05".into())),
                ..TaskEdit::default()
            },
            time::UtcOffset::UTC,
        )
        .expect("edit task");
    assert!(edited);

    let expected = service.state();
    drop(service);

    let reopened = open(&dir);
    assert_eq!(*reopened.state(), *expected);
    let task = reopened.state().task(&id).cloned().expect("task persisted");
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.due_date, Some(datetime!(2025-06-05 00:00 UTC)));
    assert_eq!(task.subtask_progress(), (0, 1));
}

#[test]
fn refused_actions_do_not_touch_the_file() {
    let dir = TempDir::with_prefix("whisperrflow-service-").expect("create temp dir");
    let mut service = open(&dir);
    let now = service.now();
    service
        .reset(sample_state(now).expect("sample state"))
        .expect("seed");
    let before = fs::read(snapshot_path(&dir)).expect("read snapshot");

    let missing: TaskId = "task-404".parse().unwrap();
    assert!(service.apply(|store| store.delete_task(&missing)).is_err());
    assert!(
        service
            .apply(|store| store.delete_project(&ProjectId::inbox()))
            .is_err()
    );

    assert_eq!(fs::read(snapshot_path(&dir)).expect("read snapshot"), before);
    let stored = JsonFileStore::new(snapshot_path(&dir))
        .load()
        .expect("load snapshot")
        .expect("snapshot exists");
    assert_eq!(stored.tasks.len(), 10);
}
