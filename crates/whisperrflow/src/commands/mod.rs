mod handlers;
mod render;

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use whisperrflow_app::{FlowConfig, FlowService, JsonFileStore, SystemClock, resolve_author};

use crate::Command;

pub use handlers::{Session, run};

const DATA_DIR: &str = "whisperrflow";
const DATA_FILE: &str = "state.json";

/// Load configuration and state, run one command, print to stdout.
pub fn execute(data: Option<PathBuf>, config_path: Option<PathBuf>, command: Command) -> Result<()> {
    let workdir = env::current_dir().context("failed to resolve the working directory")?;
    let config = match config_path {
        Some(path) => FlowConfig::from_path(&path)?,
        None => FlowConfig::from_workdir(&workdir)?,
    };
    let data_file = resolve_data_file(data, &config, &workdir, dirs::data_dir());
    debug!(path = %data_file.display(), "using snapshot");

    let owner = resolve_author(None, None, &config.author).id;
    let service = FlowService::open(JsonFileStore::new(data_file), Arc::new(SystemClock), owner)?;
    let mut session = Session::new(service, config);
    let mut out = io::stdout().lock();
    run(command, &mut session, &mut out)
}

/// `--data`, then `[storage] data_file`, then the platform data directory.
fn resolve_data_file(
    explicit: Option<PathBuf>,
    config: &FlowConfig,
    workdir: &Path,
    data_dir: Option<PathBuf>,
) -> PathBuf {
    explicit
        .or_else(|| config.storage.data_file_in(workdir))
        .unwrap_or_else(|| {
            data_dir.map_or_else(
                || workdir.join(".whisperrflow").join(DATA_FILE),
                |dir| dir.join(DATA_DIR).join(DATA_FILE),
            )
        })
}
