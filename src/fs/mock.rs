// src/fs/mock.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::FileSystem;

/// In-memory filesystem. Clones share the same contents, so a test can keep
/// a handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    write_log: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without counting it as a write.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.lock().insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Number of `write` calls so far.
    pub fn write_count(&self) -> usize {
        self.log().len()
    }

    /// Number of `write` calls whose path lies under `dir`.
    pub fn writes_under(&self, dir: impl AsRef<Path>) -> usize {
        self.log()
            .iter()
            .filter(|p| p.starts_with(dir.as_ref()))
            .count()
    }

    pub fn reset_write_count(&self) {
        self.log().clear();
    }

    /// Paths currently stored, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.write_log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock().get(path) {
            Some(content) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.lock().insert(path.to_path_buf(), contents.to_vec());
        self.log().push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.exists(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.lock().remove(path);
        Ok(())
    }
}
