//! Active-record facade for the shellac object store
//!
//! This crate gives every entity type a uniform, ActiveRecord-style
//! surface over the context-scoped store:
//! - creation ([`ActiveRecord::create`])
//! - primary-key and attribute-map find-or-create
//! - predicate/sort/count/delete queries
//! - per-type customization hooks ([`Entity`])
//!
//! Every entry point comes in a default-scope variant (resolves to the
//! installed main stack's main scope and requires the main thread) and an
//! explicit-scope `_in` variant usable from any thread.
//!
//! Find-or-create runs on a single process-wide serial lane
//! ([`AtomicExecutor::global`]), which is what makes concurrent callers
//! unable to create duplicate records for the same key.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atomic;
pub mod context;
pub mod entity;
pub mod facade;
pub mod query;
pub mod resolve;

pub use atomic::AtomicExecutor;
pub use context::{install_main_stack, main_stack, uninstall_main_stack};
pub use entity::Entity;
pub use facade::ActiveRecord;
