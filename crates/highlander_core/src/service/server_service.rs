//! Strategy-aware resiliency server operations.
//!
//! # Responsibility
//! - Filter servers by resiliency strategy.
//! - Replace a failed server under an explicit row lock.
//!
//! # Invariants
//! - A replacement inherits group, strategy and side from the failed server.
//! - The failed server stays locked until the replacement is recorded.

use super::entity_api::with_transaction;
use crate::context::CallerContext;
use crate::db::Store;
use crate::model::record::{EntityId, Values};
use crate::model::resiliency::{ResiliencyServer, StrategyType};
use crate::model::schema::EntityKind;
use crate::model::Entity;
use crate::repo::{RepoError, RepoResult};
use log::info;
use serde_json::{json, Value as JsonValue};

/// Fields a replacement takes from the failed server.
const INHERITED_FIELDS: &[&str] = &[
    "strategy_type",
    "resiliency_server_group_id",
    "resiliency_id",
    "is_recovery",
    "replacement_resiliency_server_id",
];

/// Live visible servers running `strategy`, ordered by name.
pub fn list_resiliency_servers_by_strategy(
    store: &Store,
    ctx: &CallerContext,
    strategy: StrategyType,
) -> RepoResult<Vec<ResiliencyServer>> {
    let mut filters = Values::new();
    filters.insert("strategy_type".to_string(), json!(strategy.as_str()));
    with_transaction(store, ctx, |session| {
        session.repo::<ResiliencyServer>().list(&filters)
    })
}

/// Server `id`, reported as missing when it runs another strategy.
pub fn get_resiliency_server_of_strategy(
    store: &Store,
    ctx: &CallerContext,
    strategy: StrategyType,
    id: EntityId,
) -> RepoResult<ResiliencyServer> {
    let server = with_transaction(store, ctx, |session| {
        session.repo::<ResiliencyServer>().get(id)
    })?;
    if server.strategy_type != strategy {
        return Err(RepoError::not_found(EntityKind::ResiliencyServer, id));
    }
    Ok(server)
}

/// Creates a recovery server for `failed_id` and links the two.
///
/// `values` carries the replacement's own fields (name, instance, ...);
/// group, strategy and side come from the failed server.
///
/// # Errors
/// - `NotFound` when the failed server is missing or invisible.
/// - `InvalidInput` when `values` sets an inherited field or the failed
///   server was already replaced.
pub fn replace_resiliency_server(
    store: &Store,
    ctx: &CallerContext,
    failed_id: EntityId,
    values: &Values,
) -> RepoResult<ResiliencyServer> {
    if let Some(field) = INHERITED_FIELDS
        .iter()
        .find(|field| values.contains_key(**field))
    {
        return Err(RepoError::InvalidInput(format!(
            "`{field}` of a replacement server is inherited from the failed server"
        )));
    }

    let replacement = with_transaction(store, ctx, |session| {
        session.acquire_lock(EntityKind::ResiliencyServer, failed_id)?;
        let servers = session.repo::<ResiliencyServer>();
        let failed = servers.get(failed_id)?;
        if let Some(existing) = failed.replacement_resiliency_server_id {
            return Err(RepoError::InvalidInput(format!(
                "ResiliencyServer {failed_id} was already replaced by {existing}"
            )));
        }

        let mut document = values.clone();
        document.insert(
            "strategy_type".to_string(),
            json!(failed.strategy_type.as_str()),
        );
        document.insert(
            "resiliency_server_group_id".to_string(),
            json!(failed.resiliency_server_group_id),
        );
        document.insert("resiliency_id".to_string(), json!(failed.resiliency_id));
        document.insert("is_recovery".to_string(), JsonValue::Bool(true));
        let replacement = servers.create(&document)?;

        let mut link = Values::new();
        link.insert(
            "replacement_resiliency_server_id".to_string(),
            json!(replacement.id()),
        );
        servers.update(failed_id, &link)?;
        Ok(replacement)
    })?;

    info!(
        "event=server_replace module=service status=ok failed_id={} replacement_id={}",
        failed_id,
        replacement.id()
    );
    Ok(replacement)
}
