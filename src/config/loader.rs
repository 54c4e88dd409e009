// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a TOML config file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a config file and validate it into a [`ConfigFile`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load `path` if given, else the default config file if it exists, else
/// fall back to built-in defaults. An explicitly given path must exist.
pub fn load_or_default(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => load_and_validate(path),
        None => {
            let default = default_config_path();
            if default.is_file() {
                load_and_validate(default)
            } else {
                debug!(path = ?default, "no config file; using defaults");
                Ok(ConfigFile::default())
            }
        }
    }
}

/// `TaskGraph.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("TaskGraph.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TaskGraph.toml");
        fs::write(&path, "[database]\nroot_path = \"store\"\n").unwrap();

        let cfg = load_or_default(Some(&path)).unwrap();
        assert_eq!(cfg.database.root_path, PathBuf::from("store"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_or_default(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, crate::errors::TaskGraphError::IoError(_)));
    }
}
