//! In-memory context-scoped object store for shellac
//!
//! This crate is the persistence collaborator the record facade sits on:
//! a graph of scopes (one main scope, any number of background scopes),
//! each holding live, mutable record instances per entity type.
//!
//! Scopes are strictly isolated: every fetch, count, insert, and delete
//! targets exactly one scope and never reaches into a parent or child.
//! The only cross-scope operation is an explicit [`ObjectStack::save`],
//! which merges a background scope's changes into the main scope by
//! logical identity. Nothing in this crate ever saves implicitly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod record;
pub mod scope;
pub mod stack;

pub use record::{Record, RecordId};
pub use scope::{Scope, ScopeId, ScopeKind};
pub use stack::ObjectStack;
