//! Error types for shellac
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Configuration mistakes (missing primary key, empty attribute map) and
//! thread-affinity violations are ordinary `Err` values on the production
//! path; the record crate logs them at error level at the point of
//! detection.

use thiserror::Error;

/// Result type alias for shellac operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the record facade and its store
#[derive(Debug, Error)]
pub enum Error {
    /// Primary-key lookup on an entity type that declares no primary key
    #[error("entity type `{entity}` declares no primary-key attribute")]
    MissingPrimaryKey {
        /// Entity type name
        entity: &'static str,
    },

    /// Attribute-map lookup with an empty map
    #[error("attribute match on `{entity}` requires a non-empty attribute map")]
    EmptyAttributeMap {
        /// Entity type name
        entity: &'static str,
    },

    /// Main-scope convenience entry point called off the main thread
    #[error("`{operation}` must be called from the main thread; use the explicit-scope variant elsewhere")]
    NotMainThread {
        /// Name of the offending operation
        operation: &'static str,
    },

    /// No process-wide main stack has been installed
    #[error("no main object stack installed; call install_main_stack first")]
    MainStackUnset,

    /// Atomic block submitted from within an executing atomic block
    #[error("atomic blocks are non-reentrant: run() called from inside an executing block")]
    ReentrantAtomic,

    /// Atomic executor has been shut down
    #[error("atomic executor has been shut down")]
    ExecutorShutdown,

    /// Failure propagated uninterpreted from the underlying store
    #[error("store error: {0}")]
    Store(String),
}
