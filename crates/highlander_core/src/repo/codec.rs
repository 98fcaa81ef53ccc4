//! Row <-> typed entity mapping driven by column metadata.

use super::entity_repo::{RepoError, RepoResult};
use crate::model::record::Values;
use crate::model::schema::{Column, ColumnType, EntityKind};
use crate::model::Entity;
use rusqlite::types::Value as SqlValue;
use rusqlite::Row;
use serde_json::Value as JsonValue;

/// Reads a row selected with `query::select_list(kind)` into a column map.
pub(crate) fn read_row(kind: EntityKind, row: &Row<'_>) -> RepoResult<Values> {
    let mut values = Values::new();
    for (index, column) in kind.all_columns().enumerate() {
        let raw: SqlValue = row.get(index)?;
        values.insert(column.name.to_string(), from_sql(kind, column, raw)?);
    }
    Ok(values)
}

fn from_sql(kind: EntityKind, column: Column, raw: SqlValue) -> RepoResult<JsonValue> {
    let invalid = |found: &str| {
        RepoError::InvalidData(format!(
            "unexpected {found} in {}.{}",
            kind.table(),
            column.name
        ))
    };
    match (column.ty, raw) {
        (_, SqlValue::Null) => Ok(JsonValue::Null),
        (ColumnType::Text, SqlValue::Text(text)) => Ok(JsonValue::String(text)),
        (ColumnType::Integer, SqlValue::Integer(number)) => Ok(JsonValue::from(number)),
        (ColumnType::Bool, SqlValue::Integer(0)) => Ok(JsonValue::Bool(false)),
        (ColumnType::Bool, SqlValue::Integer(1)) => Ok(JsonValue::Bool(true)),
        (ColumnType::Json, SqlValue::Text(text)) => {
            serde_json::from_str(&text).map_err(|_| invalid("malformed json"))
        }
        (ColumnType::Bool, SqlValue::Integer(other)) => Err(invalid(&format!("flag {other}"))),
        (_, SqlValue::Integer(_)) => Err(invalid("integer")),
        (_, SqlValue::Real(_)) => Err(invalid("real")),
        (_, SqlValue::Text(_)) => Err(invalid("text")),
        (_, SqlValue::Blob(_)) => Err(invalid("blob")),
    }
}

/// Converts one JSON value into the storage value of `column`.
///
/// # Errors
/// - `InvalidInput` when the value has the wrong shape for the column.
pub(crate) fn to_sql(kind: EntityKind, column: Column, value: &JsonValue) -> RepoResult<SqlValue> {
    let converted = match (column.ty, value) {
        (_, JsonValue::Null) => Some(SqlValue::Null),
        (ColumnType::Text, JsonValue::String(text)) => Some(SqlValue::Text(text.clone())),
        (ColumnType::Integer, JsonValue::Number(number)) => number.as_i64().map(SqlValue::Integer),
        (ColumnType::Bool, JsonValue::Bool(flag)) => Some(SqlValue::Integer(i64::from(*flag))),
        (ColumnType::Json, document) => Some(SqlValue::Text(document.to_string())),
        _ => None,
    };
    converted.ok_or_else(|| {
        RepoError::InvalidInput(format!(
            "wrong value type for {}.{}",
            kind.label(),
            column.name
        ))
    })
}

/// Decodes a stored row; failures mean the persisted data is corrupt.
pub(crate) fn decode<E: Entity>(values: Values) -> RepoResult<E> {
    serde_json::from_value(JsonValue::Object(values)).map_err(|err| {
        RepoError::InvalidData(format!("cannot decode {} row: {err}", E::KIND.label()))
    })
}

/// Builds an entity from a caller-influenced document.
pub(crate) fn build<E: Entity>(values: Values) -> RepoResult<E> {
    serde_json::from_value(JsonValue::Object(values))
        .map_err(|err| RepoError::InvalidInput(format!("invalid {}: {err}", E::KIND.label())))
}

pub(crate) fn encode<E: Entity>(entity: &E) -> RepoResult<Values> {
    match serde_json::to_value(entity) {
        Ok(JsonValue::Object(values)) => Ok(values),
        Ok(_) => Err(RepoError::InvalidData(format!(
            "{} does not encode to an object",
            E::KIND.label()
        ))),
        Err(err) => Err(RepoError::InvalidData(format!(
            "cannot encode {}: {err}",
            E::KIND.label()
        ))),
    }
}
