// File: ./src/logging.rs
//! Process-wide file logger.
//!
//! The first successful `init` wins; later calls return the path already in
//! use without touching the logger.
use crate::context::AppContext;
use anyhow::{Context, Result};
use log::LevelFilter;
use once_cell::sync::OnceCell;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;
use std::path::PathBuf;

static LOG_PATH: OnceCell<PathBuf> = OnceCell::new();

/// Appends log records to `coursemate.log` in the context's data directory.
pub fn init(ctx: &dyn AppContext, level: LevelFilter) -> Result<PathBuf> {
    let path = LOG_PATH.get_or_try_init(|| -> Result<PathBuf> {
        let path = ctx.get_log_file_path()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {:?}", path))?;

        let config = ConfigBuilder::new()
            .set_target_level(LevelFilter::Error)
            .set_thread_level(LevelFilter::Off)
            .build();

        WriteLogger::init(level, config, file).context("Logger already installed")?;
        log::info!(
            "Coursemate v{} logging at {}",
            env!("CARGO_PKG_VERSION"),
            level
        );
        Ok(path)
    })?;
    Ok(path.clone())
}

/// Path of the active log file, if `init` has run.
pub fn log_path() -> Option<PathBuf> {
    LOG_PATH.get().cloned()
}
