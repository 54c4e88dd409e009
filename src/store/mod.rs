// src/store/mod.rs

//! Persistence gate: hash-gated saves, loads and the autosave loop.

pub mod autosave;
pub mod database;
pub mod hash;

pub use autosave::run_autosave_loop;
pub use database::{DatabaseManager, SaveReport};
pub use hash::{compute_data_hash, HashStore, MemoryHashStore};
