//! Core types for shellac
//!
//! This crate defines the value and query vocabulary shared by the object
//! store and the record facade:
//! - Value: unified attribute value enum
//! - AttributeMap: ordered attribute-name → value mapping
//! - Predicate: comparison/boolean filter tree evaluated against attributes
//! - SortKey: stable multi-key sort specification
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod predicate;
pub mod value;

pub use error::{Error, Result};
pub use predicate::{Predicate, SortKey};
pub use value::{AttributeMap, Value};
