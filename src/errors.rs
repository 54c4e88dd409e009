// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

/// What kind of entity a [`TaskGraphError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Task,
    Issue,
    Dependency,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::Issue => "issue",
            EntityKind::Dependency => "dependency",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum TaskGraphError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskGraphError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        TaskGraphError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for the request-level "referenced entity is absent" failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskGraphError::NotFound { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskGraphError>;
