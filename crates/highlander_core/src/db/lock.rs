//! Row-level mutual exclusion for `(entity kind, id)` keys.
//!
//! # Responsibility
//! - Serialize racing writers on one row for the rest of a transaction.
//! - Hide the backend-dependent mechanism behind [`LockManager`].
//!
//! # Invariants
//! - The strategy is chosen once when the store opens, from declared capability.
//! - Only live rows visible to the caller can be locked.
//! - Lock-table rows never outlive the transaction that wrote them.

use super::migrations::LOCK_TABLE;
use super::DbResult;
use crate::model::record::{now_epoch_ms, EntityId};
use crate::model::schema::EntityKind;
use rusqlite::{params, Connection};

/// Mechanism used to hold a row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrategy {
    /// Touch `updated_at` and rely on the backend's row lock.
    TouchUpdate,
    /// Record the holder in `entity_locks`.
    LockTable,
}

impl LockStrategy {
    /// Selects the strategy for a backend with or without row-level locking.
    pub fn for_capability(row_level_locking: bool) -> Self {
        if row_level_locking {
            Self::TouchUpdate
        } else {
            Self::LockTable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TouchUpdate => "touch_update",
            Self::LockTable => "lock_table",
        }
    }

    pub(crate) fn manager(self) -> Box<dyn LockManager> {
        match self {
            Self::TouchUpdate => Box::new(TouchUpdateLock),
            Self::LockTable => Box::new(LockTableLock),
        }
    }
}

/// One lock acquisition on behalf of a session.
#[derive(Debug, Clone, Copy)]
pub struct LockRequest<'a> {
    pub kind: EntityKind,
    pub id: EntityId,
    /// Caller tenant; the row must be visible to it.
    pub project_id: &'a str,
    /// Session holding the lock.
    pub holder: &'a str,
}

pub trait LockManager: Send + Sync {
    fn strategy(&self) -> LockStrategy;

    /// Blocks until the row is held by `request.holder`.
    ///
    /// Returns `Ok(false)` when no live visible row matches the key.
    fn acquire(&self, conn: &Connection, request: &LockRequest<'_>) -> DbResult<bool>;

    /// Drops every lock held by `holder`; called right before commit.
    fn release_all(&self, conn: &Connection, holder: &str) -> DbResult<usize>;
}

pub struct TouchUpdateLock;

impl LockManager for TouchUpdateLock {
    fn strategy(&self) -> LockStrategy {
        LockStrategy::TouchUpdate
    }

    fn acquire(&self, conn: &Connection, request: &LockRequest<'_>) -> DbResult<bool> {
        let touched = conn.execute(
            &format!(
                "UPDATE {}
                 SET updated_at = ?1
                 WHERE id = ?2
                   AND deleted_at IS NULL
                   AND (project_id = ?3 OR scope = 'public');",
                request.kind.table()
            ),
            params![
                now_epoch_ms(),
                request.id.to_string(),
                request.project_id
            ],
        )?;
        Ok(touched > 0)
    }

    fn release_all(&self, _conn: &Connection, _holder: &str) -> DbResult<usize> {
        Ok(0)
    }
}

pub struct LockTableLock;

impl LockManager for LockTableLock {
    fn strategy(&self) -> LockStrategy {
        LockStrategy::LockTable
    }

    fn acquire(&self, conn: &Connection, request: &LockRequest<'_>) -> DbResult<bool> {
        let visible: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM {}
                    WHERE id = ?1
                      AND deleted_at IS NULL
                      AND (project_id = ?2 OR scope = 'public')
                 );",
                request.kind.table()
            ),
            params![request.id.to_string(), request.project_id],
            |row| row.get(0),
        )?;
        if !visible {
            return Ok(false);
        }

        conn.execute(
            &format!(
                "INSERT INTO {LOCK_TABLE} (entity_type, entity_id, holder, acquired_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (entity_type, entity_id)
                 DO UPDATE SET holder = excluded.holder, acquired_at = excluded.acquired_at;"
            ),
            params![
                request.kind.table(),
                request.id.to_string(),
                request.holder,
                now_epoch_ms()
            ],
        )?;
        Ok(true)
    }

    fn release_all(&self, conn: &Connection, holder: &str) -> DbResult<usize> {
        let released = conn.execute(
            &format!("DELETE FROM {LOCK_TABLE} WHERE holder = ?1;"),
            [holder],
        )?;
        Ok(released)
    }
}
