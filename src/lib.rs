// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod state;
pub mod store;
pub mod types;

use std::future::Future;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::dag::TaskGraph;
use crate::engine::run_scheduler_loop;
use crate::fs::{FileSystem, RealFileSystem};
use crate::state::{AppState, SharedState};
use crate::store::{run_autosave_loop, DatabaseManager, SaveReport};

/// High-level entry point used by `main.rs`.
///
/// Loads config and the database, then runs the scheduler and autosave
/// loops until Ctrl-C. On the way out the scheduler queue is saved and every
/// project is force-written.
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_or_default(args.config.as_deref()).context("loading config")?;
    if let Some(dir) = args.data_dir {
        cfg.database.root_path = dir;
    }

    let database = DatabaseManager::new(RealFileSystem, cfg.database.root_path.clone());
    let mut state = AppState::new(database);
    let loaded = state.load().context("loading database")?;
    info!(root = ?cfg.database.root_path, projects = loaded, "database loaded");

    if args.dry_run {
        print_dry_run(&cfg, &mut state.graph, state.scheduler.len());
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
        }
    };
    serve(state.into_shared(), &cfg, shutdown).await?;
    Ok(())
}

/// Run both background loops until `shutdown` completes, then stop them,
/// persist the scheduler queue and force-save every project.
pub async fn serve<F, S>(state: SharedState<F>, cfg: &ConfigFile, shutdown: S) -> Result<SaveReport>
where
    F: FileSystem + 'static,
    S: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = watch::channel(false);

    let scheduler = tokio::spawn(run_scheduler_loop(
        state.clone(),
        cfg.runtime_options(),
        stop_rx.clone(),
    ));
    let autosave = tokio::spawn(run_autosave_loop(
        state.clone(),
        cfg.autosave_interval(),
        stop_rx,
    ));

    shutdown.await;
    info!("shutdown requested; stopping loops");
    let _ = stop_tx.send(true);

    scheduler.await.context("joining scheduler loop")??;
    autosave.await.context("joining autosave loop")??;

    let report = state.lock().await.save_all()?;
    info!(projects = report.written, "final save complete");
    Ok(report)
}

/// Print a per-project summary without starting any loop.
fn print_dry_run(cfg: &ConfigFile, graph: &mut TaskGraph, queued_events: usize) {
    println!("taskgraph dry-run");
    println!("  database.root_path = {:?}", cfg.database.root_path);
    println!(
        "  database.autosave_interval_secs = {}",
        cfg.database.autosave_interval_secs
    );
    println!(
        "  scheduler.drain_interval_ms = {}, idle_interval_ms = {}",
        cfg.scheduler.drain_interval_ms, cfg.scheduler.idle_interval_ms
    );
    println!("  queued events: {queued_events}");
    println!();

    let summaries = graph.get_data();
    println!("projects ({}):", summaries.len());
    for (id, summary) in &summaries {
        println!("  - {} [{:?}] {id}", summary.name, summary.status);
        if let Ok(project) = graph.get_project(id) {
            let stats = project.statistics();
            println!(
                "      done: {}, active: {}, pending: {}, snoozed: {}",
                stats.done, stats.active, stats.pending, stats.snoozed
            );
        }
    }

    debug!("dry-run complete (no loops started)");
}
