//! Ownership graph rules: reference visibility, strategy agreement, cascade.
//!
//! # Responsibility
//! - Reject writes whose references point at missing or invisible rows.
//! - Keep `strategy_type` consistent along group -> server group -> server.
//! - Soft-delete owned descendants before their parent.
//!
//! # Invariants
//! - Cascade follows owning links only; plain cross-links never cascade.
//! - Cascade does not re-filter children by tenant; they belong to the parent.

use super::entity_repo::{RepoError, RepoResult};
use crate::model::record::Values;
use crate::model::resiliency::StrategyType;
use crate::model::schema::EntityKind;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value as JsonValue;

const CASCADE_CHUNK: usize = 500;

/// Checks that every non-null reference in `row` names a live, visible row.
///
/// With `patch`, only references the patch touches are checked.
pub(crate) fn check_references(
    conn: &Connection,
    project_id: &str,
    kind: EntityKind,
    row: &Values,
    patch: Option<&Values>,
) -> RepoResult<()> {
    for link in kind.links() {
        if patch.is_some_and(|patch| !patch.contains_key(link.column)) {
            continue;
        }
        let Some(JsonValue::String(target_id)) = row.get(link.column) else {
            continue;
        };
        let visible: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM {}
                    WHERE id = ?1
                      AND deleted_at IS NULL
                      AND (project_id = ?2 OR scope = 'public')
                 );",
                link.target.table()
            ),
            params![target_id, project_id],
            |found| found.get(0),
        )?;
        if !visible {
            return Err(RepoError::not_found(link.target, target_id));
        }
    }
    Ok(())
}

/// Business rules that the table constraints cannot express.
///
/// `previous` is the stored row when `row` is an update.
pub(crate) fn check_invariants(
    conn: &Connection,
    kind: EntityKind,
    row: &Values,
    previous: Option<&Values>,
) -> RepoResult<()> {
    if let Some(previous) = previous {
        if previous.get("strategy_type") != row.get("strategy_type") {
            return Err(RepoError::InvalidInput(format!(
                "strategy_type of {} cannot change after creation",
                kind.label()
            )));
        }
    }

    match kind {
        EntityKind::ResiliencyServerGroup => {
            check_parent_strategy(conn, kind, row)?;
        }
        EntityKind::ResiliencyServer => {
            check_parent_strategy(conn, kind, row)?;
            check_side(row)?;
        }
        EntityKind::ResiliencyDiskLogical | EntityKind::ResiliencyNicLogical => {
            check_discriminator(kind, row, "logical")?;
        }
        EntityKind::ResiliencyDisk => check_discriminator(kind, row, "physical")?,
        EntityKind::ResiliencyNic => check_discriminator(kind, row, "port")?,
        EntityKind::FtPvm => check_ft_server(conn, row)?,
        _ => {}
    }
    Ok(())
}

fn check_parent_strategy(conn: &Connection, kind: EntityKind, row: &Values) -> RepoResult<()> {
    let Some(parent) = kind.parent() else {
        return Ok(());
    };
    let Some(JsonValue::String(parent_id)) = row.get(parent.column) else {
        return Ok(());
    };
    let Some(parent_strategy) = stored_strategy(conn, parent.target, parent_id)? else {
        return Ok(());
    };
    let strategy = row.get("strategy_type").and_then(JsonValue::as_str);
    if strategy != Some(parent_strategy.as_str()) {
        return Err(RepoError::InvalidInput(format!(
            "{} strategy_type `{}` does not match {} strategy_type `{}`",
            kind.label(),
            strategy.unwrap_or("null"),
            parent.target.label(),
            parent_strategy
        )));
    }
    Ok(())
}

fn check_side(row: &Values) -> RepoResult<()> {
    let Some(side) = row.get("resiliency_id").and_then(JsonValue::as_i64) else {
        return Ok(());
    };
    let strategy = strategy_of(row)?;
    if !strategy.accepts_side(side) {
        return Err(RepoError::InvalidInput(format!(
            "resiliency_id {side} is not a valid side for a {} server",
            strategy.as_str()
        )));
    }
    Ok(())
}

fn check_discriminator(kind: EntityKind, row: &Values, expected: &str) -> RepoResult<()> {
    let found = row.get("type").and_then(JsonValue::as_str);
    if found != Some(expected) {
        return Err(RepoError::InvalidInput(format!(
            "{} must have type `{expected}`, got `{}`",
            kind.label(),
            found.unwrap_or("null")
        )));
    }
    Ok(())
}

fn check_ft_server(conn: &Connection, row: &Values) -> RepoResult<()> {
    let Some(JsonValue::String(server_id)) = row.get("resiliency_server_id") else {
        return Ok(());
    };
    match stored_strategy(conn, EntityKind::ResiliencyServer, server_id)? {
        Some(strategy) if strategy != StrategyType::Ft.as_str() => {
            Err(RepoError::InvalidInput(format!(
                "FTPvm requires an ft server, ResiliencyServer {server_id} is `{strategy}`"
            )))
        }
        _ => Ok(()),
    }
}

fn strategy_of(row: &Values) -> RepoResult<StrategyType> {
    let raw = row.get("strategy_type").cloned().unwrap_or(JsonValue::Null);
    serde_json::from_value(raw)
        .map_err(|err| RepoError::InvalidInput(format!("invalid strategy_type: {err}")))
}

fn stored_strategy(conn: &Connection, kind: EntityKind, id: &str) -> RepoResult<Option<String>> {
    let strategy = conn
        .query_row(
            &format!("SELECT strategy_type FROM {} WHERE id = ?1;", kind.table()),
            [id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(strategy)
}

/// Soft-deletes `ids` of `kind` and every live descendant.
///
/// Returns the number of rows of `kind` stamped.
pub(crate) fn cascade_soft_delete(
    conn: &Connection,
    kind: EntityKind,
    ids: &[String],
    now: i64,
) -> RepoResult<usize> {
    let mut stamped = 0;
    for chunk in ids.chunks(CASCADE_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");

        for (child, column) in kind.children() {
            let mut stmt = conn.prepare(&format!(
                "SELECT id FROM {} WHERE {column} IN ({placeholders}) AND deleted_at IS NULL;",
                child.table()
            ))?;
            let child_ids = stmt
                .query_map(params_from_iter(chunk.iter()), |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            cascade_soft_delete(conn, child, &child_ids, now)?;
        }

        let mut binds = vec![SqlValue::Integer(now), SqlValue::Integer(now)];
        binds.extend(chunk.iter().cloned().map(SqlValue::Text));
        stamped += conn.execute(
            &format!(
                "UPDATE {}
                 SET deleted_at = ?, updated_at = ?
                 WHERE id IN ({placeholders}) AND deleted_at IS NULL;",
                kind.table()
            ),
            params_from_iter(binds),
        )?;
    }
    Ok(stamped)
}
