//! Persisted entity model.
//!
//! # Responsibility
//! - Define the envelope, the table metadata and the typed entity records.
//! - Bind every record type to its `EntityKind` through [`Entity`].
//!
//! # Invariants
//! - Struct field names equal column names, so a row decodes through serde.
//! - Children hold their parent's id, never a live reference.

pub mod ft;
pub mod record;
pub mod resiliency;
pub mod schema;

use record::{EntityId, Record};
use schema::EntityKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A typed row of one entity table.
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug {
    const KIND: EntityKind;

    fn record(&self) -> &Record;

    fn id(&self) -> EntityId {
        self.record().id
    }
}

macro_rules! impl_entity {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: EntityKind = EntityKind::$kind;

                fn record(&self) -> &Record {
                    &self.record
                }
            }
        )+
    };
}

impl_entity!(
    resiliency::ResiliencyGroup => ResiliencyGroup,
    resiliency::ResiliencyServerGroup => ResiliencyServerGroup,
    resiliency::ResiliencyServer => ResiliencyServer,
    resiliency::ResiliencyDiskLogical => ResiliencyDiskLogical,
    resiliency::ResiliencyDisk => ResiliencyDisk,
    resiliency::ResiliencyNicLogical => ResiliencyNicLogical,
    resiliency::ResiliencyNic => ResiliencyNic,
    ft::FtPvm => FtPvm,
    ft::FtGuestOs => FtGuestOs,
    ft::FtLDisk => FtLDisk,
    ft::FtLNic => FtLNic,
    ft::FtALink => FtALink,
    ft::FtPath => FtPath,
    ft::FtQuorum => FtQuorum,
    ft::FtQLink => FtQLink,
    ft::FtAx => FtAx,
    ft::FtGuest => FtGuest,
    ft::FtDisk => FtDisk,
    ft::FtNic => FtNic,
    ft::FtLinkA => FtLinkA,
);
