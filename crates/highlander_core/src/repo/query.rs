//! Tenant-scoped query construction.
//!
//! # Responsibility
//! - Restrict every table scan to live rows the caller may see.
//! - Translate equality filters into bound SQL conditions.
//!
//! # Invariants
//! - Every query starts from `deleted_at IS NULL AND (project_id = ? OR scope = 'public')`.
//! - Column names come from static metadata; filter values are always bound.

use super::codec;
use super::entity_repo::{RepoError, RepoResult};
use crate::model::record::{EntityId, Values};
use crate::model::schema::{EntityKind, SortKey};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};

pub(crate) struct ScopedQuery {
    kind: EntityKind,
    conditions: Vec<String>,
    binds: Vec<SqlValue>,
}

impl ScopedQuery {
    /// Live rows of `kind` owned by `project_id` or public.
    pub(crate) fn visible_to(kind: EntityKind, project_id: &str) -> Self {
        Self {
            kind,
            conditions: vec![
                "deleted_at IS NULL".to_string(),
                "(project_id = ? OR scope = 'public')".to_string(),
            ],
            binds: vec![SqlValue::Text(project_id.to_string())],
        }
    }

    pub(crate) fn with_id(mut self, id: EntityId) -> Self {
        self.conditions.push("id = ?".to_string());
        self.binds.push(SqlValue::Text(id.to_string()));
        self
    }

    /// Adds one equality condition per filter; `null` matches `IS NULL`.
    pub(crate) fn with_filters(mut self, filters: &Values) -> RepoResult<Self> {
        for (name, value) in filters {
            let column = self.kind.column(name).ok_or_else(|| {
                RepoError::InvalidInput(format!(
                    "unknown filter `{name}` for {}",
                    self.kind.label()
                ))
            })?;
            if value.is_null() {
                self.conditions.push(format!("{} IS NULL", column.name));
            } else {
                self.conditions.push(format!("{} = ?", column.name));
                self.binds.push(codec::to_sql(self.kind, column, value)?);
            }
        }
        Ok(self)
    }

    /// Matching rows as column-keyed maps, in default order.
    pub(crate) fn rows(&self, conn: &Connection) -> RepoResult<Vec<Values>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {};",
            select_list(self.kind),
            self.kind.table(),
            self.conditions.join(" AND "),
            order_by(self.kind)
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(self.binds.iter()))?;
        let mut found = Vec::new();
        while let Some(row) = rows.next()? {
            found.push(codec::read_row(self.kind, row)?);
        }
        Ok(found)
    }

    /// Ids of matching rows, in default order.
    pub(crate) fn ids(&self, conn: &Connection) -> RepoResult<Vec<String>> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} ORDER BY {};",
            self.kind.table(),
            self.conditions.join(" AND "),
            order_by(self.kind)
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(self.binds.iter()), |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

pub(crate) fn select_list(kind: EntityKind) -> String {
    kind.all_columns()
        .map(|column| column.name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn order_by(kind: EntityKind) -> &'static str {
    match kind.sort_key() {
        SortKey::Name => "name ASC, id ASC",
        // Same-millisecond rows keep insertion order.
        SortKey::CreatedAt => "created_at ASC, rowid ASC",
    }
}
