//! SQLite storage handle, sessions, locks and schema lifecycle.
//!
//! # Responsibility
//! - Own the storage handle threaded explicitly through every call.
//! - Hand out one connection per session and scope transactions on it.
//! - Apply and tear down versioned schema migrations.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Sessions refuse to start until the schema is at the latest version.
//! - A connection is never shared by two concurrent transactions.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod lock;
pub mod migrations;
mod open;
pub mod session;
pub mod store;

pub use lock::{LockManager, LockRequest, LockStrategy, LockTableLock, TouchUpdateLock};
pub use session::Session;
pub use store::Store;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    SchemaNotReady {
        expected_version: u32,
        actual_version: u32,
    },
    NoActiveTransaction,
    SchemaSetup(String),
    InvalidConfig(String),
    /// Another session kept the store busy past the busy timeout.
    Busy {
        waited_ms: u64,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotReady {
                expected_version,
                actual_version,
            } => write!(
                f,
                "database schema is at version {actual_version}, expected {expected_version}; run setup first"
            ),
            Self::NoActiveTransaction => write!(f, "mutation requires an active transaction"),
            Self::SchemaSetup(message) => write!(f, "schema setup failed: {message}"),
            Self::InvalidConfig(message) => write!(f, "invalid store configuration: {message}"),
            Self::Busy { waited_ms } => {
                write!(f, "database is busy; gave up after {waited_ms} ms")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::SchemaNotReady { .. }
            | Self::NoActiveTransaction
            | Self::SchemaSetup(_)
            | Self::InvalidConfig(_)
            | Self::Busy { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
