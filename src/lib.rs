//! Shellac - active-record facade over a context-scoped object store
//!
//! Shellac gives every persisted entity type a uniform record surface:
//! creation, primary-key and attribute-map find-or-create, predicate and
//! sort queries, counting, and bulk deletion, each in a main-scope
//! convenience form and an explicit-scope form.
//!
//! # Quick Start
//!
//! ```
//! use shellac::{install_main_stack, ActiveRecord, Entity, ObjectStack, Value};
//!
//! struct Artist;
//!
//! impl Entity for Artist {
//!     fn entity_name() -> &'static str {
//!         "artist"
//!     }
//!     fn primary_key() -> Option<&'static str> {
//!         Some("remote_id")
//!     }
//! }
//!
//! # fn main() -> shellac::Result<()> {
//! install_main_stack(ObjectStack::new());
//!
//! // Find-or-create by primary key: at most one record per key value
//! let bowie = Artist::with_primary_key(Value::Int(42), true)?.unwrap();
//! bowie.set("name", "Bowie");
//!
//! let same = Artist::with_primary_key(Value::Int(42), true)?.unwrap();
//! assert_eq!(bowie, same);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `shellac-core`: values, attribute maps, predicates, sort keys, errors
//! - `shellac-store`: the in-memory scope graph ([`ObjectStack`], [`Scope`])
//! - `shellac-record`: the facade ([`Entity`], [`ActiveRecord`], the
//!   serial [`AtomicExecutor`] lane behind find-or-create)
//!
//! Scope changes reach the main scope only through an explicit
//! [`ObjectStack::save`]; nothing in the facade saves implicitly.

pub use shellac_core::{AttributeMap, Error, Predicate, Result, SortKey, Value};
pub use shellac_record::facade::delete;
pub use shellac_record::{
    install_main_stack, main_stack, uninstall_main_stack, ActiveRecord, AtomicExecutor, Entity,
};
pub use shellac_store::{ObjectStack, Record, RecordId, Scope, ScopeId, ScopeKind};
