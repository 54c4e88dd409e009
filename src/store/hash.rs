// src/store/hash.rs

use std::collections::HashMap;

use blake3::Hasher;
use tracing::debug;

use crate::types::ProjectId;

/// Hex-encoded blake3 digest of `bytes`.
pub fn compute_data_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Last-written content hash per project.
pub trait HashStore: Send + Sync {
    fn load(&self, project: &str) -> Option<String>;
    fn save(&mut self, project: &str, hash: &str);
    fn remove(&mut self, project: &str);
    /// Forget hashes of projects that are not in `active`.
    fn prune(&mut self, active: &[&str]);
}

/// Stores hashes in memory only; a fresh process always writes once.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<ProjectId, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, project: &str) -> Option<String> {
        self.map.get(project).cloned()
    }

    fn save(&mut self, project: &str, hash: &str) {
        self.map.insert(project.to_string(), hash.to_string());
        debug!(project = %project, hash = %hash, "stored project hash");
    }

    fn remove(&mut self, project: &str) {
        self.map.remove(project);
    }

    fn prune(&mut self, active: &[&str]) {
        let initial_len = self.map.len();
        self.map.retain(|k, _| active.contains(&k.as_str()));
        if self.map.len() < initial_len {
            debug!(removed = initial_len - self.map.len(), "pruned stale project hashes");
        }
    }
}
