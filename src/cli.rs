// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskgraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskgraph",
    version,
    about = "Dependency-aware task tracker with timed wake-ups and hash-gated persistence.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `TaskGraph.toml` in the current working directory if it
    /// exists, built-in defaults otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database directory; overrides `[database].root_path`.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load the database, print a per-project summary and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = CliArgs::try_parse_from([
            "taskgraph",
            "--data-dir",
            "/tmp/tg",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/tg")));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
        assert!(args.config.is_none());
    }
}
