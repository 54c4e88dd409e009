// src/engine/runtime.rs

//! Async shell around [`EventScheduler`](super::EventScheduler).

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::state::{AppState, SharedState};

use super::RuntimeOptions;

/// Drive the scheduler until `stop` flips to `true`.
///
/// Each pass fires due events one at a time, waiting `drain_interval`
/// between them, then waits `idle_interval` once nothing is due. The lock is
/// held only while a single event fires.
pub async fn run_scheduler_loop<F: FileSystem>(
    state: SharedState<F>,
    options: RuntimeOptions,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    info!(
        drain_ms = options.drain_interval.as_millis() as u64,
        idle_ms = options.idle_interval.as_millis() as u64,
        "scheduler loop started"
    );

    'outer: loop {
        if *stop.borrow() {
            break;
        }

        loop {
            let fired = {
                let mut guard = state.lock().await;
                let AppState {
                    graph, scheduler, ..
                } = &mut *guard;
                scheduler.fire_next_due(graph, Utc::now())
            };

            match fired {
                Ok(Some(event)) => debug!(event = event.id, outcome = ?event.outcome, "tick fired event"),
                Ok(None) => break,
                Err(e) => error!(error = %e, "scheduled event failed"),
            }

            if wait_or_stop(&mut stop, options.drain_interval).await {
                break 'outer;
            }
        }

        if wait_or_stop(&mut stop, options.idle_interval).await {
            break;
        }
    }

    info!("scheduler loop stopped");
    Ok(())
}

/// Sleep for `period` unless the stop flag flips first. Returns `true` when
/// the caller should stop. A dropped sender counts as a stop request.
pub(crate) async fn wait_or_stop(stop: &mut watch::Receiver<bool>, period: Duration) -> bool {
    let changed = tokio::select! {
        _ = tokio::time::sleep(period) => Ok(()),
        changed = stop.changed() => changed,
    };
    changed.is_err() || *stop.borrow()
}
