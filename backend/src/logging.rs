//! Process-wide logger setup.
//!
//! Called once from `main` before the server starts. Every module logs through
//! the `log` macros afterwards; nothing else touches the logger.

use crate::config::AppConfig;
use chrono::Local;
use env_logger::{Env, Target};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Path of today's log file inside `log_dir`, e.g. `log/20261019.log`.
pub fn daily_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("{}.log", Local::now().format("%Y%m%d")))
}

/// Installs `env_logger` with an `info` default filter (overridable through
/// `RUST_LOG`). With a log directory configured, output is appended to the
/// day's file; without one it goes to stderr.
pub fn init(config: &AppConfig) -> io::Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    if let Some(dir) = &config.log_dir {
        fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(daily_log_path(dir))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
