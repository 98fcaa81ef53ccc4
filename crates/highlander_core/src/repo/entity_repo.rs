//! Generic tenant-scoped CRUD shared by every entity type.
//!
//! # Responsibility
//! - Implement get/find/list/create/update/create_or_update/delete/delete_all
//!   once, driven by `EntityKind` metadata.
//! - Translate backend constraint failures into the stable error taxonomy.
//!
//! # Invariants
//! - Reads return live rows visible to the session's project only.
//! - `project_id`, `id` and timestamps are stamped here, never taken from callers.
//! - Mutations require an open transaction and never commit on their own.

use super::codec;
use super::hierarchy;
use super::query::ScopedQuery;
use crate::db::{DbError, Session};
use crate::model::record::{new_entity_id, now_epoch_ms, EntityId, Values, SYSTEM_FIELDS};
use crate::model::schema::{Column, EntityKind};
use crate::model::Entity;
use log::{debug, warn};
use rusqlite::ffi;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, ErrorCode};
use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type RepoResult<T> = Result<T, RepoError>;

/// Stable failure kind surfaced to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DuplicateEntry,
    DataAccessFailure,
    InvalidInput,
}

#[derive(Debug)]
pub enum RepoError {
    NotFound { entity: &'static str, id: String },
    DuplicateEntry { entity: &'static str, key: String },
    InvalidInput(String),
    /// A persisted row cannot be decoded.
    InvalidData(String),
    Db(DbError),
}

impl RepoError {
    pub fn not_found(kind: EntityKind, id: impl Display) -> Self {
        Self::NotFound {
            entity: kind.label(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateEntry { .. } => ErrorKind::DuplicateEntry,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidData(_) | Self::Db(_) => ErrorKind::DataAccessFailure,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found [id={id}]"),
            Self::DuplicateEntry { entity, key } => write!(f, "Duplicate entry for {entity}: {key}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::DuplicateEntry { .. }
            | Self::InvalidInput(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// CRUD over entity type `E` on behalf of one session.
pub struct EntityRepository<'a, 's, E> {
    session: &'a Session<'s>,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, 's, E: Entity> EntityRepository<'a, 's, E> {
    pub fn new(session: &'a Session<'s>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    fn visible(&self) -> ScopedQuery {
        ScopedQuery::visible_to(E::KIND, self.session.context().project_id())
    }

    /// Live visible row `id`, or `NotFound`.
    pub fn get(&self, id: EntityId) -> RepoResult<E> {
        self.find(id)?
            .ok_or_else(|| RepoError::not_found(E::KIND, id))
    }

    /// Live visible row `id`, if any.
    pub fn find(&self, id: EntityId) -> RepoResult<Option<E>> {
        let _slot = self.session.read_slot()?;
        let mut rows = self.visible().with_id(id).rows(self.session.connection())?;
        match rows.pop() {
            Some(row) => Ok(Some(codec::decode(row)?)),
            None => Ok(None),
        }
    }

    /// Live visible rows matching every equality filter, in default order.
    pub fn list(&self, filters: &Values) -> RepoResult<Vec<E>> {
        let _slot = self.session.read_slot()?;
        self.visible()
            .with_filters(filters)?
            .rows(self.session.connection())?
            .into_iter()
            .map(codec::decode)
            .collect()
    }

    /// Inserts a new row owned by the session's project.
    ///
    /// # Errors
    /// - `InvalidInput` for system-managed, unknown or mistyped fields and
    ///   broken business rules.
    /// - `NotFound` when a reference names a missing or invisible row.
    /// - `DuplicateEntry` when a live row already holds the unique key.
    pub fn create(&self, values: &Values) -> RepoResult<E> {
        self.session.require_transaction()?;
        check_writable(E::KIND, values)?;
        self.insert(new_entity_id(), values)
            .inspect_err(|err| log_rejected("entity_create", E::KIND, err))
    }

    /// Overwrites the given fields of live visible row `id`.
    pub fn update(&self, id: EntityId, values: &Values) -> RepoResult<E> {
        self.session.require_transaction()?;
        check_writable(E::KIND, values)?;
        let current = self.get(id)?;
        self.overwrite(&current, values)
            .inspect_err(|err| log_rejected("entity_update", E::KIND, err))
    }

    /// Updates row `id` when it is live and visible, otherwise creates it with that id.
    ///
    /// Not atomic against a racing create of the same id unless the caller
    /// holds a lock.
    pub fn create_or_update(&self, id: EntityId, values: &Values) -> RepoResult<E> {
        self.session.require_transaction()?;
        check_writable(E::KIND, values)?;
        let outcome = match self.find(id)? {
            Some(current) => self.overwrite(&current, values),
            None => self.insert(id, values),
        };
        outcome.inspect_err(|err| log_rejected("entity_upsert", E::KIND, err))
    }

    /// Soft-deletes row `id` and every owned descendant.
    pub fn delete(&self, id: EntityId) -> RepoResult<()> {
        self.session.require_transaction()?;
        self.get(id)?;
        let stamped = hierarchy::cascade_soft_delete(
            self.session.connection(),
            E::KIND,
            &[id.to_string()],
            now_epoch_ms(),
        )?;
        debug!(
            "event=entity_delete module=repo status=ok entity={} id={} stamped={}",
            E::KIND.label(),
            id,
            stamped
        );
        Ok(())
    }

    /// Soft-deletes every live visible row matching `filters`, with descendants.
    ///
    /// Returns the number of matching rows deleted.
    pub fn delete_all(&self, filters: &Values) -> RepoResult<usize> {
        self.session.require_transaction()?;
        let ids = self
            .visible()
            .with_filters(filters)?
            .ids(self.session.connection())?;
        let stamped = hierarchy::cascade_soft_delete(
            self.session.connection(),
            E::KIND,
            &ids,
            now_epoch_ms(),
        )?;
        debug!(
            "event=entity_delete_all module=repo status=ok entity={} stamped={}",
            E::KIND.label(),
            stamped
        );
        Ok(stamped)
    }

    fn insert(&self, id: EntityId, values: &Values) -> RepoResult<E> {
        let conn = self.session.connection();
        let project_id = self.session.context().project_id();
        let now = now_epoch_ms();

        let mut document = values.clone();
        document.insert("id".to_string(), JsonValue::String(id.to_string()));
        document.insert(
            "project_id".to_string(),
            JsonValue::String(project_id.to_string()),
        );
        document.insert("created_at".to_string(), JsonValue::from(now));
        document.insert("updated_at".to_string(), JsonValue::from(now));
        document.insert("deleted_at".to_string(), JsonValue::Null);

        let entity: E = codec::build(document)?;
        let row = codec::encode(&entity)?;
        hierarchy::check_references(conn, project_id, E::KIND, &row, None)?;
        hierarchy::check_invariants(conn, E::KIND, &row, None)?;

        let columns: Vec<_> = E::KIND.all_columns().collect();
        let names = columns
            .iter()
            .map(|column| column.name)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let binds = bind_columns(E::KIND, &columns, &row)?;

        conn.execute(
            &format!(
                "INSERT INTO {} ({names}) VALUES ({placeholders});",
                E::KIND.table()
            ),
            params_from_iter(binds),
        )
        .map_err(|err| translate_write_error(E::KIND, &row, err))?;

        debug!(
            "event=entity_create module=repo status=ok entity={} id={}",
            E::KIND.label(),
            id
        );
        Ok(entity)
    }

    fn overwrite(&self, current: &E, patch: &Values) -> RepoResult<E> {
        let conn = self.session.connection();
        let previous = codec::encode(current)?;

        let mut document = previous.clone();
        for (key, value) in patch {
            document.insert(key.clone(), value.clone());
        }
        document.insert("updated_at".to_string(), JsonValue::from(now_epoch_ms()));

        let entity: E = codec::build(document)?;
        let row = codec::encode(&entity)?;
        hierarchy::check_references(
            conn,
            self.session.context().project_id(),
            E::KIND,
            &row,
            Some(patch),
        )?;
        hierarchy::check_invariants(conn, E::KIND, &row, Some(&previous))?;

        let columns: Vec<_> = E::KIND
            .all_columns()
            .filter(|column| column.name == "scope" || column.name == "updated_at")
            .chain(E::KIND.columns().iter().copied())
            .collect();
        let assignments = columns
            .iter()
            .map(|column| format!("{} = ?", column.name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut binds = bind_columns(E::KIND, &columns, &row)?;
        binds.push(SqlValue::Text(current.id().to_string()));

        conn.execute(
            &format!(
                "UPDATE {} SET {assignments} WHERE id = ?;",
                E::KIND.table()
            ),
            params_from_iter(binds),
        )
        .map_err(|err| translate_write_error(E::KIND, &row, err))?;

        debug!(
            "event=entity_update module=repo status=ok entity={} id={}",
            E::KIND.label(),
            current.id()
        );
        Ok(entity)
    }
}

fn check_writable(kind: EntityKind, values: &Values) -> RepoResult<()> {
    for key in values.keys() {
        if SYSTEM_FIELDS.contains(&key.as_str()) {
            return Err(RepoError::InvalidInput(format!(
                "`{key}` of {} is managed by the store",
                kind.label()
            )));
        }
        if kind.column(key).is_none() {
            return Err(RepoError::InvalidInput(format!(
                "unknown field `{key}` for {}",
                kind.label()
            )));
        }
    }
    Ok(())
}

fn bind_columns(kind: EntityKind, columns: &[Column], row: &Values) -> RepoResult<Vec<SqlValue>> {
    columns
        .iter()
        .map(|column| {
            let value = row.get(column.name).unwrap_or(&JsonValue::Null);
            codec::to_sql(kind, *column, value)
        })
        .collect()
}

/// Maps UNIQUE / PRIMARY KEY violations to `DuplicateEntry`.
fn translate_write_error(kind: EntityKind, row: &Values, err: rusqlite::Error) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        let unique = failure.code == ErrorCode::ConstraintViolation
            && matches!(
                failure.extended_code,
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            );
        if unique {
            return RepoError::DuplicateEntry {
                entity: kind.label(),
                key: duplicate_key(row, message.as_deref()),
            };
        }
    }
    RepoError::from(err)
}

/// Renders `col=value, ...` from `UNIQUE constraint failed: t.a, t.b`.
fn duplicate_key(row: &Values, message: Option<&str>) -> String {
    let columns: Vec<&str> = message
        .and_then(|text| text.split_once(": "))
        .map(|(_, list)| {
            list.split(", ")
                .map(|qualified| qualified.rsplit('.').next().unwrap_or(qualified))
                .collect()
        })
        .unwrap_or_else(|| vec!["id"]);

    columns
        .into_iter()
        .map(|column| {
            let value = match row.get(column) {
                Some(JsonValue::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => "?".to_string(),
            };
            format!("{column}={value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn log_rejected(event: &str, kind: EntityKind, err: &RepoError) {
    if matches!(err.kind(), ErrorKind::DataAccessFailure) {
        return;
    }
    warn!(
        "event={event} module=repo status=rejected entity={} reason={:?}",
        kind.label(),
        err.kind()
    );
}
