// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskGraphError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskGraphError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.database, raw.scheduler))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_database(cfg)?;
    validate_scheduler(cfg)?;
    Ok(())
}

fn validate_database(cfg: &RawConfigFile) -> Result<()> {
    if cfg.database.root_path.as_os_str().is_empty() {
        return Err(TaskGraphError::ConfigError(
            "[database].root_path must not be empty".to_string(),
        ));
    }
    if cfg.database.autosave_interval_secs == 0 {
        return Err(TaskGraphError::ConfigError(
            "[database].autosave_interval_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler(cfg: &RawConfigFile) -> Result<()> {
    let s = &cfg.scheduler;
    if s.drain_interval_ms == 0 || s.idle_interval_ms == 0 {
        return Err(TaskGraphError::ConfigError(format!(
            "[scheduler] intervals must be >= 1 ms (got drain_interval_ms = {}, idle_interval_ms = {})",
            s.drain_interval_ms, s.idle_interval_ms
        )));
    }
    if s.drain_interval_ms > s.idle_interval_ms {
        return Err(TaskGraphError::ConfigError(format!(
            "[scheduler].drain_interval_ms ({}) must not exceed idle_interval_ms ({})",
            s.drain_interval_ms, s.idle_interval_ms
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.database.root_path, std::path::PathBuf::from("data"));
        assert_eq!(cfg.database.autosave_interval_secs, 60);
        assert_eq!(cfg.scheduler.drain_interval_ms, 100);
        assert_eq!(cfg.scheduler.idle_interval_ms, 1000);
    }

    #[test]
    fn zero_autosave_interval_is_rejected() {
        let err = parse("[database]\nautosave_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, TaskGraphError::ConfigError(_)));
    }

    #[test]
    fn drain_longer_than_idle_is_rejected() {
        let err = parse("[scheduler]\ndrain_interval_ms = 500\nidle_interval_ms = 100\n").unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = parse("[database]\nroot = \"x\"\n").unwrap_err();
        assert!(matches!(err, TaskGraphError::TomlError(_)));
    }
}
