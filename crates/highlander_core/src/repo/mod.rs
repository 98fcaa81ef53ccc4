//! Generic repository over the persisted entity model.
//!
//! # Responsibility
//! - Scope every read and write to the caller's tenant.
//! - Map rows to typed entities and enforce ownership rules.
//!
//! # Invariants
//! - Repository calls participate in the session's transaction and never commit.

mod codec;
pub mod entity_repo;
mod hierarchy;
mod query;

pub use entity_repo::{EntityRepository, ErrorKind, RepoError, RepoResult};
