#![allow(dead_code)]

use taskgraph::fs::MockFileSystem;
use taskgraph::state::{AppState, SharedState};
use taskgraph::store::DatabaseManager;

/// Database root used by mock-backed fixtures.
pub const MOCK_ROOT: &str = "db";

/// Fresh state over an in-memory filesystem. The returned filesystem handle
/// shares contents and write counts with the one inside the state.
pub fn mock_state() -> (AppState<MockFileSystem>, MockFileSystem) {
    let fs = MockFileSystem::new();
    let state = AppState::new(DatabaseManager::new(fs.clone(), MOCK_ROOT));
    (state, fs)
}

/// [`mock_state`] wrapped for the async loops.
pub fn shared_mock_state() -> (SharedState<MockFileSystem>, MockFileSystem) {
    let (state, fs) = mock_state();
    (state.into_shared(), fs)
}
