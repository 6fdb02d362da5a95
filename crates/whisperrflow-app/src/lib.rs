//! Application layer logic for WhisperrFlow.
//!
//! This crate wraps the pure reducer from `whisperrflow-core` with an
//! observable store, persistence, configuration and the parsing helpers shared
//! by front ends such as the CLI.

/// Comment author resolution.
pub mod author;
pub mod clock;
/// `.whisperrflow/config.toml` loading.
pub mod config;
/// Filter and sort parsing from user-facing strings.
pub mod filter_util;
/// Demo workspace.
pub mod sample;
/// Service façade combining store and persistence.
pub mod service;
pub mod snapshot;
pub mod store;
/// Raw task edits diffed into updates.
pub mod task_patch;

// Re-exports for convenience
pub use author::{DEFAULT_AUTHOR_ID, DEFAULT_AUTHOR_NAME, resolve_author};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AuthorConfig, FlowConfig, StorageConfig, ViewConfig};
pub use filter_util::{
    FilterBuildError, FilterBuildResult, TaskFilterBuilder, parse_date, parse_instant, parse_sort,
    parse_timestamp,
};
pub use sample::{SAMPLE_OWNER, sample_state};
pub use service::FlowService;
pub use snapshot::{JsonFileStore, MemoryStore, SNAPSHOT_SCHEMA, SnapshotError, StateStore};
pub use store::{DispatchError, DispatchResult, Store};
pub use task_patch::{EditError, EditResult, FieldPatch, SetDiff, TaskEdit, diff_sets};
