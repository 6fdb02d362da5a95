#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use whisperrflow_core::{
    LabelId, Priority, ProjectId, SortDirection, SortField, Task, TaskDraft, TaskFilterBuilder,
    TaskId, TaskSort, TaskStats, TaskStatus, UserId,
};

const NOW: OffsetDateTime = datetime!(2025-06-15 12:00 UTC);

fn build_tasks(count: usize) -> Vec<Task> {
    let creator = UserId::new();
    let labels: Vec<LabelId> = (0..6)
        .map(|idx| {
            format!("label-{idx}")
                .parse()
                .unwrap_or_else(|err| panic!("label id: {err}"))
        })
        .collect();

    (0..count)
        .map(|idx| {
            let offset = i64::try_from(idx).unwrap_or(0);
            let mut draft = TaskDraft::new(
                format!("Task {idx} about release notes"),
                ProjectId::inbox(),
                creator.clone(),
            );
            draft.status = TaskStatus::ALL[idx % TaskStatus::ALL.len()];
            draft.priority = Priority::ALL[idx % Priority::ALL.len()];
            draft.labels.insert(labels[idx % labels.len()].clone());
            draft.due_date = (idx % 5 != 0).then(|| NOW + Duration::hours(offset * 7 - 300));
            Task::from_draft(TaskId::new(), draft, NOW - Duration::days(offset), offset)
        })
        .collect()
}

fn filter_sort_benchmark(c: &mut Criterion) {
    let filter = TaskFilterBuilder::new()
        .priorities([Priority::Urgent, Priority::High])
        .text("release")
        .build();
    let sort = TaskSort::new(SortField::DueDate, SortDirection::Asc);

    let mut group = c.benchmark_group("visible_tasks");
    for &count in &[100usize, 300, 1000] {
        let tasks = build_tasks(count);
        group.bench_with_input(BenchmarkId::new("filter_sort", count), &tasks, |b, tasks| {
            b.iter(|| black_box(sort.apply(filter.apply(tasks))));
        });
        group.bench_with_input(BenchmarkId::new("stats", count), &tasks, |b, tasks| {
            b.iter(|| black_box(TaskStats::compute(tasks, NOW)));
        });
    }
    group.finish();
}

criterion_group!(benches, filter_sort_benchmark);
criterion_main!(benches);
