//! Schema migration registry, executor and teardown.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//! - Drop every managed table for explicit teardown.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Teardown resets `user_version` to 0 so a later setup starts clean.

use crate::db::{DbError, DbResult};
use crate::model::schema::EntityKind;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_resiliency.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_ft_telemetry.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("0003_entity_locks.sql"),
    },
];

/// Lock bookkeeping table created by migration 3.
pub const LOCK_TABLE: &str = "entity_locks";

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// Returns the number of migrations applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let mut applied = 0;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        applied += 1;
    }
    tx.commit()?;

    Ok(applied)
}

/// Drops every managed table, children before parents, and resets the version.
pub fn drop_all(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {LOCK_TABLE};"))?;
    for kind in EntityKind::ALL.iter().rev() {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", kind.table()))?;
    }
    tx.execute_batch("PRAGMA user_version = 0;")?;
    tx.commit()?;
    Ok(())
}

/// Reads the applied schema version.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
