// tests/scenarios.rs

use chrono::{Duration, Utc};
use taskgraph::dag::TaskGraph;
use taskgraph::engine::{EventScheduler, WakeUpOutcome};
use taskgraph::types::TaskStatus;
use taskgraph_test_utils::builders::{ProjectBuilder, ROOT};
use taskgraph_test_utils::fixtures::{mock_state, MOCK_ROOT};
use taskgraph_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn sub_task_chain_unblocks_in_order() -> TestResult {
    init_tracing();

    let mut built = ProjectBuilder::new("P")
        .sub_task("A", ROOT)
        .sub_task("B", "A")
        .build();

    assert_eq!(built.status("B"), TaskStatus::Active);
    assert_eq!(built.status("A"), TaskStatus::Pending);
    assert_eq!(built.status(ROOT), TaskStatus::Pending);

    let b = built.id("B").to_string();
    built.project.task_done(&b)?;
    assert_eq!(built.status("A"), TaskStatus::Active);
    assert_eq!(built.status(ROOT), TaskStatus::Pending);
    Ok(())
}

#[test]
fn snoozed_task_wakes_directly_and_via_scheduler() -> TestResult {
    init_tracing();

    let t0 = Utc::now();
    let wake = t0 + Duration::seconds(10);

    let mut graph = TaskGraph::new();
    let pid = graph.new_project("P");
    let project = graph.get_project_mut(&pid)?;
    let root = project.root_task().unwrap_or_default().to_string();
    let a = project.add_sub_task(&root, None)?;
    project.task_snooze(&a, wake, Some("waiting".into()))?;

    // Before the wake time a direct resolution leaves A snoozed.
    project.resolve_dependency_at(&a, t0)?;
    assert_eq!(project.task(&a).map(|m| m.status), Some(TaskStatus::Snoozed));

    let mut scheduler = EventScheduler::new();
    scheduler.schedule_wake_up(pid.clone(), a.clone(), wake);
    assert!(scheduler.fire_due(&mut graph, t0).is_empty());
    assert_eq!(scheduler.len(), 1);

    // After it, the scheduler fires and A has no open prerequisite.
    let fired = scheduler.fire_due(&mut graph, wake + Duration::seconds(1));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].outcome, WakeUpOutcome::Resolved);

    let meta = graph.get_project(&pid)?.task(&a).ok_or("task A missing")?;
    assert_eq!(meta.status, TaskStatus::Active);
    assert!(meta.wake_after.is_none());
    Ok(())
}

#[test]
fn woken_task_with_open_prerequisite_goes_pending() -> TestResult {
    init_tracing();

    let mut built = ProjectBuilder::new("P")
        .sub_task("A", ROOT)
        .sub_task("B", "A")
        .build();
    let a = built.id("A").to_string();
    let t0 = Utc::now();
    built.project.task_snooze(&a, t0, None)?;

    built.project.resolve_dependency_at(&a, t0 + Duration::seconds(1))?;
    assert_eq!(built.status("A"), TaskStatus::Pending);
    Ok(())
}

#[test]
fn removing_shared_prerequisite_activates_both_successors() -> TestResult {
    init_tracing();

    let mut built = ProjectBuilder::new("P")
        .sub_task("S1", ROOT)
        .sub_task("S2", ROOT)
        .sub_task("X", "S1")
        .depends("S2", "X")
        .build();

    assert_eq!(built.status("S1"), TaskStatus::Pending);
    assert_eq!(built.status("S2"), TaskStatus::Pending);

    let x = built.id("X").to_string();
    built.project.remove_task(&x)?;

    assert_eq!(built.status("S1"), TaskStatus::Active);
    assert_eq!(built.status("S2"), TaskStatus::Active);
    assert!(built.project.task(&x).is_none());
    Ok(())
}

#[test]
fn second_hash_gated_save_writes_no_project_files() -> TestResult {
    init_tracing();

    let (mut state, fs) = mock_state();
    let pid = state.graph.new_project("P");
    let project = state.graph.get_project_mut(&pid)?;
    let root = project.root_task().unwrap_or_default().to_string();
    project.add_sub_task(&root, None)?;
    state.graph.new_project("Q");

    let first = state.autosave()?;
    assert_eq!(first.written, 2);

    fs.reset_write_count();
    let second = state.autosave()?;
    assert_eq!(second.written, 0);
    assert_eq!(fs.writes_under(format!("{MOCK_ROOT}/projects")), 0);
    Ok(())
}

#[test]
fn wake_up_for_deleted_task_is_consumed_quietly() -> TestResult {
    init_tracing();

    let t0 = Utc::now();
    let mut graph = TaskGraph::new();
    let pid = graph.new_project("P");
    let project = graph.get_project_mut(&pid)?;
    let root = project.root_task().unwrap_or_default().to_string();
    let a = project.add_sub_task(&root, None)?;
    project.task_snooze(&a, t0, None)?;
    project.remove_task(&a)?;
    let before = project.serialize()?;

    let mut scheduler = EventScheduler::new();
    scheduler.schedule_wake_up(pid.clone(), a.clone(), t0);

    let fired = scheduler.fire_next_due(&mut graph, t0 + Duration::seconds(1))?;
    assert_eq!(fired.map(|e| e.outcome), Some(WakeUpOutcome::TaskGone));
    assert!(scheduler.is_empty());
    assert_eq!(graph.get_project(&pid)?.serialize()?, before);
    Ok(())
}

#[test]
fn wake_up_for_deleted_project_is_consumed_quietly() -> TestResult {
    init_tracing();

    let t0 = Utc::now();
    let mut graph = TaskGraph::new();
    let pid = graph.new_project("P");
    let mut scheduler = EventScheduler::new();
    scheduler.schedule_wake_up(pid.clone(), "any", t0);
    graph.remove_project(&pid)?;

    let fired = scheduler.fire_next_due(&mut graph, t0)?;
    assert_eq!(fired.map(|e| e.outcome), Some(WakeUpOutcome::ProjectGone));
    assert!(scheduler.is_empty());
    Ok(())
}
