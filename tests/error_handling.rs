// tests/error_handling.rs

use std::io::Write;

use chrono::Utc;
use tempfile::NamedTempFile;
use taskgraph::config::load_and_validate;
use taskgraph::dag::{TaskGraph, TaskGraphProject};
use taskgraph::errors::{EntityKind, TaskGraphError};
use taskgraph_test_utils::builders::{ProjectBuilder, ROOT};

#[test]
fn unknown_entities_report_their_kind() {
    let mut built = ProjectBuilder::new("P").sub_task("A", ROOT).build();
    let a = built.id("A").to_string();

    match built.project.task_done("ghost") {
        Err(TaskGraphError::NotFound { kind, id }) => {
            assert_eq!(kind, EntityKind::Task);
            assert_eq!(id, "ghost");
        }
        other => panic!("Expected NotFound task, got: {:?}", other),
    }

    match built.project.task_close_issue(&a, "ghost-issue", None) {
        Err(TaskGraphError::NotFound { kind, .. }) => assert_eq!(kind, EntityKind::Issue),
        other => panic!("Expected NotFound issue, got: {:?}", other),
    }

    match built.project.remove_dependency_edge("ghost-edge") {
        Err(TaskGraphError::NotFound { kind, .. }) => assert_eq!(kind, EntityKind::Dependency),
        other => panic!("Expected NotFound dependency, got: {:?}", other),
    }

    let mut graph = TaskGraph::new();
    match graph.remove_project("ghost-project") {
        Err(e @ TaskGraphError::NotFound { .. }) => {
            assert_eq!(e.to_string(), "project not found: ghost-project");
        }
        other => panic!("Expected NotFound project, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn self_dependency_is_invalid() {
    let mut built = ProjectBuilder::new("P").sub_task("A", ROOT).build();
    let a = built.id("A").to_string();

    let result = built.project.add_dependency(&a, &a);
    assert!(matches!(result, Err(TaskGraphError::InvalidState(_))));
}

#[test]
fn snoozed_task_without_wake_time_is_invalid_state() {
    let json = r#"{
        "name": "corrupt",
        "DAG": {"nodes": [{"id": "t"}], "links": []},
        "metadata": {"t": {"status": "snoozed"}}
    }"#;
    let mut project = TaskGraphProject::from_json(json).unwrap();

    let result = project.resolve_dependency_at("t", Utc::now());
    match result {
        Err(TaskGraphError::InvalidState(msg)) => assert!(msg.contains("wake_after")),
        other => panic!("Expected InvalidState, got: {:?}", other),
    }
}

#[test]
fn malformed_project_document_is_a_serialization_error() {
    let result = TaskGraphProject::from_json("{\"name\": 3}");
    assert!(matches!(result, Err(TaskGraphError::Serialization(_))));
}

#[test]
fn invalid_scheduler_config_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[scheduler]
drain_interval_ms = 0
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(TaskGraphError::ConfigError(msg)) => assert!(msg.contains("drain_interval_ms")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}
