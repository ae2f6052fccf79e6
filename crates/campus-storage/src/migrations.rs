//! Database migrations
//!
//! The schema version lives in SQLite's `user_version` pragma. Each step
//! runs once, in order.

use crate::Result;
use rusqlite::Connection;

type Migration = fn(&Connection) -> Result<()>;

/// Index `i` upgrades the schema from version `i` to `i + 1`
const MIGRATIONS: &[Migration] = &[migrate_v1];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (index, migration) in MIGRATIONS.iter().enumerate().skip(current.max(0) as usize) {
        let version = index + 1;
        tracing::info!(version, "Running storage migration");
        migration(conn)?;
        conn.pragma_update(None, "user_version", version as i64)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS storage_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#,
    )?;

    Ok(())
}
