use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use whisperrflow_core::{SortDirection, SortField, TaskFilter, TaskSort};

const CONFIG_DIR: &str = ".whisperrflow";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration loaded from `.whisperrflow/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowConfig {
    /// Default list view.
    #[serde(default)]
    pub view: ViewConfig,
    /// Default comment author.
    #[serde(default)]
    pub author: AuthorConfig,
    /// Snapshot location.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl FlowConfig {
    /// Location of the configuration file below `workdir`.
    #[must_use]
    pub fn path_in(workdir: impl AsRef<Path>) -> PathBuf {
        workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from a working directory; a missing file yields defaults.
    ///
    /// # Errors
    /// Fails when the file exists but cannot be read, parsed or validated.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = Self::path_in(workdir);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_path(&config_path)
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    /// Fails when the file cannot be read, parsed or validated.
    pub fn from_path(config_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("failed to load {}", config_path.display()))?;
        Ok(config)
    }

    /// Parse and validate TOML text.
    ///
    /// # Errors
    /// Fails on malformed TOML or invalid values.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.author.validate()?;
        self.storage.validate()
    }
}

/// `[view]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    /// Field used when a listing does not request one.
    #[serde(default)]
    pub sort_field: Option<SortField>,
    /// Direction used when a listing does not request one.
    #[serde(default)]
    pub sort_direction: Option<SortDirection>,
    /// Show completed tasks by default.
    #[serde(default)]
    pub show_completed: Option<bool>,
    /// Show archived tasks by default.
    #[serde(default)]
    pub show_archived: Option<bool>,
}

impl ViewConfig {
    /// Configured sort, falling back to the default for missing parts.
    #[must_use]
    pub fn sort(&self) -> TaskSort {
        let fallback = TaskSort::default();
        TaskSort::new(
            self.sort_field.unwrap_or(fallback.field),
            self.sort_direction.unwrap_or(fallback.direction),
        )
    }

    /// Default filter carrying the configured visibility flags.
    #[must_use]
    pub fn filter(&self) -> TaskFilter {
        let mut filter = TaskFilter::default();
        if let Some(show) = self.show_completed {
            filter.show_completed = show;
        }
        if let Some(show) = self.show_archived {
            filter.show_archived = show;
        }
        filter
    }
}

/// `[author]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorConfig {
    /// Author identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

impl AuthorConfig {
    fn validate(&self) -> Result<()> {
        if self.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            bail!("author.id must not be empty");
        }
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            bail!("author.name must not be empty");
        }
        Ok(())
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Snapshot file, relative paths resolved against the working directory.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self
            .data_file
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            bail!("storage.data_file must not be empty");
        }
        Ok(())
    }

    /// Resolve the configured data file against `workdir`.
    #[must_use]
    pub fn data_file_in(&self, workdir: &Path) -> Option<PathBuf> {
        self.data_file.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                workdir.join(path)
            }
        })
    }
}
