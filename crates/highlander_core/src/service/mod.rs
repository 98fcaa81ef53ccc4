//! Boundary functions consumed by request handlers and operator tooling.
//!
//! # Responsibility
//! - Give every entity type a transaction-per-call CRUD surface.
//! - Host multi-step workflows that need explicit locking.

pub mod entity_api;
pub mod server_service;
