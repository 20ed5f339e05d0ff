//! Embedded schema migrations.
//!
//! Each step is recorded in `schema_migrations` once applied; steps run in
//! version order inside their own transaction.

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration {version} ({name}) failed: {source}")]
    Step {
        version: u32,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    name: "config_and_endpoints",
    sql: include_str!("001_initial.sql"),
}];

const TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

fn recorded_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.execute(TRACKING_TABLE, [])?;
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Bring the schema up to date. Returns how many steps were applied.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let from = recorded_version(conn)?;
    let mut applied = 0;

    for step in STEPS.iter().filter(|s| s.version > from) {
        let fail = |source: rusqlite::Error| MigrationError::Step {
            version: step.version,
            name: step.name,
            source,
        };

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(step.sql).map_err(fail)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![step.version, step.name],
        )
        .map_err(fail)?;
        tx.commit().map_err(fail)?;

        tracing::info!(version = step.version, "Applied migration {}", step.name);
        applied += 1;
    }

    Ok(applied)
}

/// Schema version recorded in the database.
pub fn current_version(conn: &Connection) -> Result<u32, MigrationError> {
    Ok(recorded_version(conn)?)
}

/// Version the schema reaches after all embedded steps run.
pub fn latest_version() -> u32 {
    STEPS.iter().map(|s| s.version).max().unwrap_or(0)
}
