// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::RuntimeOptions;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [database]
/// root_path = "data"
/// autosave_interval_secs = 60
///
/// [scheduler]
/// drain_interval_ms = 100
/// idle_interval_ms = 1000
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub scheduler: SchedulerSection,
}

/// `[database]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    /// Directory holding `projects.json`, `projects/` and `scheduler.json`.
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Seconds between two hash-gated autosaves.
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
}

fn default_root_path() -> PathBuf {
    PathBuf::from("data")
}

fn default_autosave_interval_secs() -> u64 {
    60
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            autosave_interval_secs: default_autosave_interval_secs(),
        }
    }
}

/// `[scheduler]` section: the two-tier wait of the tick loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    /// Wait between consecutive due events.
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,

    /// Wait once nothing is due.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
}

fn default_drain_interval_ms() -> u64 {
    100
}

fn default_idle_interval_ms() -> u64 {
    1000
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            drain_interval_ms: default_drain_interval_ms(),
            idle_interval_ms: default_idle_interval_ms(),
        }
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub scheduler: SchedulerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(database: DatabaseSection, scheduler: SchedulerSection) -> Self {
        Self {
            database,
            scheduler,
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.database.autosave_interval_secs)
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            drain_interval: Duration::from_millis(self.scheduler.drain_interval_ms),
            idle_interval: Duration::from_millis(self.scheduler.idle_interval_ms),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(DatabaseSection::default(), SchedulerSection::default())
    }
}
