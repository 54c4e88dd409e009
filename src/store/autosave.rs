// src/store/autosave.rs

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::engine::runtime::wait_or_stop;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::state::SharedState;

/// Run a hash-gated `save_database` every `interval` until `stop` flips.
///
/// A failed save is logged and retried on the next tick.
pub async fn run_autosave_loop<F: FileSystem>(
    state: SharedState<F>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    info!(interval_secs = interval.as_secs(), "autosave loop started");

    loop {
        if *stop.borrow() {
            break;
        }
        if wait_or_stop(&mut stop, interval).await {
            break;
        }

        let mut guard = state.lock().await;
        match guard.autosave() {
            Ok(report) => debug!(written = report.written, skipped = report.skipped, "autosave tick"),
            Err(e) => error!(error = %e, "autosave failed"),
        }
    }

    info!("autosave loop stopped");
    Ok(())
}
