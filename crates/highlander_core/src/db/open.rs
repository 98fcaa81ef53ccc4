//! Connection bootstrap.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and the configured busy timeout.
//! - File connections run in the configured journal mode.

use super::DbResult;
use crate::config::{JournalMode, StoreConfig};
use log::{debug, error};
use rusqlite::{Connection, OpenFlags};
use std::time::{Duration, Instant};

/// Where a connection points: a file path or a shared-cache memory URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    File(String),
    Memory(String),
}

impl Target {
    pub(crate) fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory(_) => "memory",
        }
    }

    fn address(&self) -> &str {
        match self {
            Self::File(path) | Self::Memory(path) => path,
        }
    }
}

/// Opens one configured connection to `target`.
pub(crate) fn open_connection(target: &Target, config: &StoreConfig) -> DbResult<Connection> {
    let started_at = Instant::now();

    let conn = match Connection::open_with_flags(target.address(), OpenFlags::default()) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                target.mode(),
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = configure(&conn, target, config) {
        error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_configure_failed error={}",
            target.mode(),
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err);
    }

    debug!(
        "event=db_open module=db status=ok mode={} duration_ms={}",
        target.mode(),
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn configure(conn: &Connection, target: &Target, config: &StoreConfig) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    if matches!(target, Target::File(_)) && config.journal_mode == JournalMode::Wal {
        let mode: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            config.journal_mode.as_pragma(),
            |row| row.get(0),
        )?;
        debug!("event=db_journal_mode module=db status=ok mode={mode}");
    }
    Ok(())
}
