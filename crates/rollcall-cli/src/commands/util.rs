//! Shared helpers for command implementations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc, Weekday};

use rollcall_db::Database;

use crate::Config;

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// An explicit instant if given, otherwise the wall clock. Commands accept
/// `--at` so corrections and tests can pin the clock.
pub fn now_or(at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    at.unwrap_or_else(Utc::now)
}

/// Parses weekday names ("mon", "tuesday", ...) as given on the command line.
pub fn parse_weekdays(names: &[String]) -> Result<Vec<Weekday>> {
    names
        .iter()
        .map(|name| {
            name.parse()
                .map_err(|_| anyhow::anyhow!("unknown weekday: {name}"))
        })
        .collect()
}
