//! Storage handle: configuration, lock strategy and session factory.
//!
//! # Responsibility
//! - Resolve the configured location into a connection target.
//! - Create, inspect and drop the schema for operator tooling.
//! - Open one fresh connection per session.
//!
//! # Invariants
//! - No process-global state; callers pass the `Store` by reference.
//! - An in-memory store stays alive exactly as long as its anchor connection.
//! - On an in-memory store at most one session holds the writer slot; the
//!   others wait up to `busy_timeout_ms` for it.

use super::lock::{LockManager, LockStrategy};
use super::migrations::{apply_migrations, current_user_version, drop_all, latest_version};
use super::open::{open_connection, Target};
use super::session::Session;
use super::{DbError, DbResult};
use crate::config::{StoreConfig, StoreLocation};
use crate::context::CallerContext;
use log::{info, warn};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::time::Duration;
use uuid::Uuid;

/// Exclusive right to run statements on a shared-cache memory database.
pub(crate) type WriterSlot<'s> = MutexGuard<'s, ()>;

pub struct Store {
    config: StoreConfig,
    target: Target,
    locks: Box<dyn LockManager>,
    /// Shared-cache connections fail with `SQLITE_LOCKED` instead of
    /// honouring the busy timeout, so memory stores queue here.
    writer: Option<Mutex<()>>,
    _anchor: Option<Mutex<Connection>>,
}

impl Store {
    /// Opens the configured backend without touching the schema.
    ///
    /// # Errors
    /// - `InvalidConfig` when `config` fails validation.
    pub fn open(config: StoreConfig) -> DbResult<Self> {
        config
            .validate()
            .map_err(|err| DbError::InvalidConfig(err.to_string()))?;

        let target = match &config.location {
            StoreLocation::File { path } => Target::File(path.to_string_lossy().into_owned()),
            StoreLocation::Memory => Target::Memory(format!(
                "file:highlander-mem-{}?mode=memory&cache=shared",
                Uuid::new_v4().simple()
            )),
        };

        let anchor = open_connection(&target, &config)?;
        let (anchor, writer) = match target {
            Target::Memory(_) => (Some(Mutex::new(anchor)), Some(Mutex::new(()))),
            Target::File(_) => (None, None),
        };

        let strategy = LockStrategy::for_capability(config.row_level_locking);
        info!(
            "event=store_open module=db status=ok mode={} lock_strategy={}",
            target.mode(),
            strategy.as_str()
        );

        Ok(Self {
            config,
            target,
            locks: strategy.manager(),
            writer,
            _anchor: anchor,
        })
    }

    /// Opens a private in-memory store with default settings.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(StoreConfig::in_memory())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn lock_strategy(&self) -> LockStrategy {
        self.locks.strategy()
    }

    /// Creates every missing table by applying pending migrations.
    ///
    /// Returns the schema version afterwards.
    pub fn setup_schema(&self) -> DbResult<u32> {
        let mut conn = self.connect()?;
        let applied = apply_migrations(&mut conn).map_err(as_setup_error)?;
        let version = current_user_version(&conn)?;
        info!(
            "event=schema_setup module=db status=ok applied={} version={}",
            applied, version
        );
        Ok(version)
    }

    /// Drops every managed table and resets the schema version to 0.
    pub fn drop_schema(&self) -> DbResult<()> {
        let mut conn = self.connect()?;
        drop_all(&mut conn).map_err(as_setup_error)?;
        info!("event=schema_drop module=db status=ok");
        Ok(())
    }

    pub fn schema_version(&self) -> DbResult<u32> {
        let conn = self.connect()?;
        current_user_version(&conn)
    }

    /// Opens a session acting as `ctx` on a connection of its own.
    ///
    /// # Errors
    /// - `SchemaNotReady` unless the schema is at the latest version.
    pub fn session(&self, ctx: CallerContext) -> DbResult<Session<'_>> {
        let conn = self.connect()?;
        let actual_version = current_user_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(DbError::SchemaNotReady {
                expected_version,
                actual_version,
            });
        }
        Ok(Session::new(self, conn, ctx))
    }

    pub(crate) fn lock_manager(&self) -> &dyn LockManager {
        self.locks.as_ref()
    }

    /// Waits for the writer slot of a memory store; file stores have none.
    ///
    /// # Errors
    /// - `Busy` when the slot stays taken for `busy_timeout_ms`.
    pub(crate) fn writer_slot(&self) -> DbResult<Option<WriterSlot<'_>>> {
        let Some(writer) = &self.writer else {
            return Ok(None);
        };
        let waited_ms = self.config.busy_timeout_ms;
        match writer.try_lock_for(Duration::from_millis(waited_ms)) {
            Some(slot) => Ok(Some(slot)),
            None => {
                warn!("event=writer_slot module=db status=error waited_ms={waited_ms}");
                Err(DbError::Busy { waited_ms })
            }
        }
    }

    fn connect(&self) -> DbResult<Connection> {
        open_connection(&self.target, &self.config)
    }
}

fn as_setup_error(err: DbError) -> DbError {
    match err {
        DbError::Sqlite(inner) => DbError::SchemaSetup(inner.to_string()),
        other => other,
    }
}
