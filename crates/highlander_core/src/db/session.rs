//! Transaction scopes bound to one connection and one caller.
//!
//! # Responsibility
//! - Open, commit, discard and nest transaction scopes.
//! - Carry the caller context every repository call filters by.
//! - Route explicit row locks to the store's lock manager.
//!
//! # Invariants
//! - At most one physical transaction is open; nested scopes reuse it.
//! - Only the outermost `commit` persists; inner commits are no-ops.
//! - Ending the outermost scope with uncommitted work discards it.
//! - Dropping a session with an open transaction rolls it back.
//! - The store's writer slot, if any, is held exactly while the physical
//!   transaction is open.

use super::lock::LockRequest;
use super::store::{Store, WriterSlot};
use super::{DbError, DbResult};
use crate::context::CallerContext;
use crate::model::record::EntityId;
use crate::model::schema::EntityKind;
use crate::model::Entity;
use crate::repo::entity_repo::{EntityRepository, RepoError, RepoResult};
use log::{debug, warn};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use uuid::Uuid;

/// One caller's connection to the store.
pub struct Session<'s> {
    store: &'s Store,
    conn: Connection,
    ctx: CallerContext,
    holder: String,
    depth: Cell<u32>,
    open: Cell<bool>,
    slot: RefCell<Option<WriterSlot<'s>>>,
}

impl<'s> Session<'s> {
    pub(crate) fn new(store: &'s Store, conn: Connection, ctx: CallerContext) -> Self {
        Self {
            store,
            conn,
            ctx,
            holder: Uuid::new_v4().simple().to_string(),
            depth: Cell::new(0),
            open: Cell::new(false),
            slot: RefCell::new(None),
        }
    }

    pub fn context(&self) -> &CallerContext {
        &self.ctx
    }

    /// Whether a physical transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.open.get()
    }

    /// Current scope nesting depth.
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Opens a scope, starting the physical transaction if none is open.
    pub fn begin(&self) -> DbResult<()> {
        if !self.open.get() {
            let slot = self.store.writer_slot()?;
            self.conn.execute_batch("BEGIN IMMEDIATE;")?;
            self.open.set(true);
            *self.slot.borrow_mut() = slot;
            debug!(
                "event=tx_begin module=db status=ok session={} project={}",
                self.holder,
                self.ctx.project_id()
            );
        }
        self.depth.set(self.depth.get() + 1);
        Ok(())
    }

    /// Persists the physical transaction when called from the outermost scope.
    ///
    /// Lock-table rows held by this session are released first.
    pub fn commit(&self) -> DbResult<()> {
        match self.depth.get() {
            0 => Err(DbError::NoActiveTransaction),
            1 if self.open.get() => {
                let released = self
                    .store
                    .lock_manager()
                    .release_all(&self.conn, &self.holder)?;
                self.conn.execute_batch("COMMIT;")?;
                self.close();
                debug!(
                    "event=tx_commit module=db status=ok session={} locks_released={}",
                    self.holder, released
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Discards the whole physical transaction, whatever the depth.
    pub fn rollback(&self) -> DbResult<()> {
        if self.open.get() {
            self.conn.execute_batch("ROLLBACK;")?;
            self.close();
            debug!(
                "event=tx_rollback module=db status=ok session={}",
                self.holder
            );
        }
        Ok(())
    }

    /// Closes one scope; the outermost one discards anything uncommitted.
    pub fn end(&self) -> DbResult<()> {
        let depth = self.depth.get();
        if depth == 0 {
            return Ok(());
        }
        self.depth.set(depth - 1);
        if depth == 1 && self.open.get() {
            self.conn.execute_batch("ROLLBACK;")?;
            self.close();
            debug!(
                "event=tx_discard module=db status=ok session={}",
                self.holder
            );
        }
        Ok(())
    }

    /// Runs `body` in a scope: commit on `Ok`, `end` on every exit.
    ///
    /// An `Err` from `body` is not rolled back explicitly; the outermost
    /// `end` discards the uncommitted work.
    pub fn transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        self.begin()?;
        let outcome = body(self).and_then(|value| {
            self.commit()?;
            Ok(value)
        });
        let ended = self.end();
        let value = outcome?;
        ended?;
        Ok(value)
    }

    /// Repository for entity type `E` bound to this session.
    pub fn repo<E: Entity>(&self) -> EntityRepository<'_, 's, E> {
        EntityRepository::new(self)
    }

    /// Locks one live, visible row until this session's transaction ends.
    ///
    /// # Errors
    /// - `NoActiveTransaction` outside a transaction.
    /// - `NotFound` when no live visible row has `id`.
    pub fn acquire_lock(&self, kind: EntityKind, id: EntityId) -> RepoResult<()> {
        self.require_transaction()?;
        let manager = self.store.lock_manager();
        let request = LockRequest {
            kind,
            id,
            project_id: self.ctx.project_id(),
            holder: &self.holder,
        };
        if !manager.acquire(&self.conn, &request)? {
            return Err(RepoError::not_found(kind, id));
        }
        debug!(
            "event=lock_acquire module=db status=ok strategy={} entity={} id={} session={}",
            manager.strategy().as_str(),
            kind.label(),
            id,
            self.holder
        );
        Ok(())
    }

    /// Writer slot for one statement run outside a transaction.
    pub(crate) fn read_slot(&self) -> DbResult<Option<WriterSlot<'s>>> {
        if self.open.get() {
            Ok(None)
        } else {
            self.store.writer_slot()
        }
    }

    fn close(&self) {
        self.open.set(false);
        self.slot.borrow_mut().take();
    }

    pub(crate) fn require_transaction(&self) -> DbResult<()> {
        if self.open.get() {
            Ok(())
        } else {
            Err(DbError::NoActiveTransaction)
        }
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.open.get() {
            if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
                warn!(
                    "event=tx_drop module=db status=error session={} error={}",
                    self.holder, err
                );
            }
        }
    }
}
