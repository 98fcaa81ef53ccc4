//! Secure, transactional persistence layer for resiliency configuration.
//!
//! Every read is filtered by tenant, every write runs inside an explicit
//! transaction scope, and deletes are soft and cascade down the ownership
//! graph.

pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{
    ConfigError, HighlanderConfig, JournalMode, LoggingConfig, StoreConfig, StoreLocation,
};
pub use context::{CallerContext, ContextError, DEFAULT_PROJECT_ID};
pub use db::{DbError, DbResult, LockStrategy, Session, Store};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{into_values, EntityId, Record, Scope, Values};
pub use model::schema::EntityKind;
pub use model::Entity;
pub use repo::{EntityRepository, ErrorKind, RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
