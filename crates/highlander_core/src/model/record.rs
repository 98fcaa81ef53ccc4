//! Envelope fields shared by every persisted entity.
//!
//! # Responsibility
//! - Define the identity, ownership and lifecycle columns common to all tables.
//! - Provide the `Values` patch map used by create/update paths.
//!
//! # Invariants
//! - `id`, `project_id`, `created_at`, `updated_at` and `deleted_at` are
//!   managed by the store and never accepted from callers.
//! - `deleted_at` is set once by soft delete and never cleared.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of every persisted entity.
pub type EntityId = Uuid;

/// Column-name keyed field map used for create, update and list filters.
pub type Values = serde_json::Map<String, serde_json::Value>;

/// Envelope columns that callers may never write.
pub const SYSTEM_FIELDS: &[&str] = &["id", "project_id", "created_at", "updated_at", "deleted_at"];

/// Row visibility across tenants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Visible to the owning project only.
    #[default]
    Private,
    /// Visible to every project.
    Public,
}

impl Scope {
    /// Returns the persisted column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

/// Common envelope flattened into every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Generated at insert time unless supplied by `create_or_update`.
    pub id: EntityId,
    #[serde(default)]
    pub scope: Scope,
    /// Owning tenant, stamped from the caller context.
    pub project_id: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every mutation.
    pub updated_at: i64,
    /// Soft-delete tombstone. `None` while the row is live.
    pub deleted_at: Option<i64>,
}

impl Record {
    /// Returns whether the row is still live.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Converts a JSON object literal into a `Values` map.
///
/// Returns `None` when `value` is not an object.
pub fn into_values(value: serde_json::Value) -> Option<Values> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

pub(crate) fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}
