//! Per-entity boundary functions for request handlers.
//!
//! # Responsibility
//! - Expose `list_/get_/create_/update_/create_or_update_/delete_` functions
//!   for every entity type.
//! - Wrap each repository call in its own session and transaction scope.
//!
//! # Invariants
//! - One call = one session = one transaction; nothing is shared between calls.

use crate::context::CallerContext;
use crate::db::{Session, Store};
use crate::model::ft::{
    FtALink, FtAx, FtDisk, FtGuest, FtGuestOs, FtLDisk, FtLNic, FtLinkA, FtNic, FtPath, FtPvm,
    FtQLink, FtQuorum,
};
use crate::model::record::{EntityId, Values};
use crate::model::resiliency::{
    ResiliencyDisk, ResiliencyDiskLogical, ResiliencyGroup, ResiliencyNic, ResiliencyNicLogical,
    ResiliencyServer, ResiliencyServerGroup,
};
use crate::model::Entity;
use crate::repo::RepoResult;

/// Runs `body` in a fresh session's transaction acting as `ctx`.
pub fn with_transaction<T>(
    store: &Store,
    ctx: &CallerContext,
    body: impl FnOnce(&Session<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let session = store.session(ctx.clone())?;
    session.transaction(body)
}

pub fn list<E: Entity>(store: &Store, ctx: &CallerContext, filters: &Values) -> RepoResult<Vec<E>> {
    with_transaction(store, ctx, |session| session.repo::<E>().list(filters))
}

pub fn get<E: Entity>(store: &Store, ctx: &CallerContext, id: EntityId) -> RepoResult<E> {
    with_transaction(store, ctx, |session| session.repo::<E>().get(id))
}

pub fn create<E: Entity>(store: &Store, ctx: &CallerContext, values: &Values) -> RepoResult<E> {
    with_transaction(store, ctx, |session| session.repo::<E>().create(values))
}

pub fn update<E: Entity>(
    store: &Store,
    ctx: &CallerContext,
    id: EntityId,
    values: &Values,
) -> RepoResult<E> {
    with_transaction(store, ctx, |session| session.repo::<E>().update(id, values))
}

pub fn create_or_update<E: Entity>(
    store: &Store,
    ctx: &CallerContext,
    id: EntityId,
    values: &Values,
) -> RepoResult<E> {
    with_transaction(store, ctx, |session| {
        session.repo::<E>().create_or_update(id, values)
    })
}

pub fn delete<E: Entity>(store: &Store, ctx: &CallerContext, id: EntityId) -> RepoResult<()> {
    with_transaction(store, ctx, |session| session.repo::<E>().delete(id))
}

pub fn delete_all<E: Entity>(
    store: &Store,
    ctx: &CallerContext,
    filters: &Values,
) -> RepoResult<usize> {
    with_transaction(store, ctx, |session| session.repo::<E>().delete_all(filters))
}

macro_rules! entity_api {
    ($(
        $entity:ty => $list:ident, $get:ident, $create:ident, $update:ident,
            $create_or_update:ident, $delete:ident, $delete_all:ident;
    )+) => {
        $(
            pub fn $list(
                store: &Store,
                ctx: &CallerContext,
                filters: &Values,
            ) -> RepoResult<Vec<$entity>> {
                list::<$entity>(store, ctx, filters)
            }

            pub fn $get(store: &Store, ctx: &CallerContext, id: EntityId) -> RepoResult<$entity> {
                get::<$entity>(store, ctx, id)
            }

            pub fn $create(
                store: &Store,
                ctx: &CallerContext,
                values: &Values,
            ) -> RepoResult<$entity> {
                create::<$entity>(store, ctx, values)
            }

            pub fn $update(
                store: &Store,
                ctx: &CallerContext,
                id: EntityId,
                values: &Values,
            ) -> RepoResult<$entity> {
                update::<$entity>(store, ctx, id, values)
            }

            pub fn $create_or_update(
                store: &Store,
                ctx: &CallerContext,
                id: EntityId,
                values: &Values,
            ) -> RepoResult<$entity> {
                create_or_update::<$entity>(store, ctx, id, values)
            }

            pub fn $delete(store: &Store, ctx: &CallerContext, id: EntityId) -> RepoResult<()> {
                delete::<$entity>(store, ctx, id)
            }

            pub fn $delete_all(
                store: &Store,
                ctx: &CallerContext,
                filters: &Values,
            ) -> RepoResult<usize> {
                delete_all::<$entity>(store, ctx, filters)
            }
        )+
    };
}

entity_api! {
    ResiliencyGroup => list_resiliency_groups, get_resiliency_group,
        create_resiliency_group, update_resiliency_group,
        create_or_update_resiliency_group, delete_resiliency_group,
        delete_resiliency_groups;
    ResiliencyServerGroup => list_resiliency_server_groups, get_resiliency_server_group,
        create_resiliency_server_group, update_resiliency_server_group,
        create_or_update_resiliency_server_group, delete_resiliency_server_group,
        delete_resiliency_server_groups;
    ResiliencyServer => list_resiliency_servers, get_resiliency_server,
        create_resiliency_server, update_resiliency_server,
        create_or_update_resiliency_server, delete_resiliency_server,
        delete_resiliency_servers;
    ResiliencyDiskLogical => list_resiliency_disk_logicals, get_resiliency_disk_logical,
        create_resiliency_disk_logical, update_resiliency_disk_logical,
        create_or_update_resiliency_disk_logical, delete_resiliency_disk_logical,
        delete_resiliency_disk_logicals;
    ResiliencyDisk => list_resiliency_disks, get_resiliency_disk,
        create_resiliency_disk, update_resiliency_disk,
        create_or_update_resiliency_disk, delete_resiliency_disk,
        delete_resiliency_disks;
    ResiliencyNicLogical => list_resiliency_nic_logicals, get_resiliency_nic_logical,
        create_resiliency_nic_logical, update_resiliency_nic_logical,
        create_or_update_resiliency_nic_logical, delete_resiliency_nic_logical,
        delete_resiliency_nic_logicals;
    ResiliencyNic => list_resiliency_nics, get_resiliency_nic,
        create_resiliency_nic, update_resiliency_nic,
        create_or_update_resiliency_nic, delete_resiliency_nic,
        delete_resiliency_nics;
    FtPvm => list_ft_pvms, get_ft_pvm, create_ft_pvm, update_ft_pvm,
        create_or_update_ft_pvm, delete_ft_pvm, delete_ft_pvms;
    FtGuestOs => list_ft_guest_oses, get_ft_guest_os, create_ft_guest_os, update_ft_guest_os,
        create_or_update_ft_guest_os, delete_ft_guest_os, delete_ft_guest_oses;
    FtLDisk => list_ft_ldisks, get_ft_ldisk, create_ft_ldisk, update_ft_ldisk,
        create_or_update_ft_ldisk, delete_ft_ldisk, delete_ft_ldisks;
    FtLNic => list_ft_lnics, get_ft_lnic, create_ft_lnic, update_ft_lnic,
        create_or_update_ft_lnic, delete_ft_lnic, delete_ft_lnics;
    FtALink => list_ft_alinks, get_ft_alink, create_ft_alink, update_ft_alink,
        create_or_update_ft_alink, delete_ft_alink, delete_ft_alinks;
    FtPath => list_ft_paths, get_ft_path, create_ft_path, update_ft_path,
        create_or_update_ft_path, delete_ft_path, delete_ft_paths;
    FtQuorum => list_ft_quorums, get_ft_quorum, create_ft_quorum, update_ft_quorum,
        create_or_update_ft_quorum, delete_ft_quorum, delete_ft_quorums;
    FtQLink => list_ft_qlinks, get_ft_qlink, create_ft_qlink, update_ft_qlink,
        create_or_update_ft_qlink, delete_ft_qlink, delete_ft_qlinks;
    FtAx => list_ft_axes, get_ft_ax, create_ft_ax, update_ft_ax,
        create_or_update_ft_ax, delete_ft_ax, delete_ft_axes;
    FtGuest => list_ft_guests, get_ft_guest, create_ft_guest, update_ft_guest,
        create_or_update_ft_guest, delete_ft_guest, delete_ft_guests;
    FtDisk => list_ft_disks, get_ft_disk, create_ft_disk, update_ft_disk,
        create_or_update_ft_disk, delete_ft_disk, delete_ft_disks;
    FtNic => list_ft_nics, get_ft_nic, create_ft_nic, update_ft_nic,
        create_or_update_ft_nic, delete_ft_nic, delete_ft_nics;
    FtLinkA => list_ft_linkas, get_ft_linka, create_ft_linka, update_ft_linka,
        create_or_update_ft_linka, delete_ft_linka, delete_ft_linkas;
}
