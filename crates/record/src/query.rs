//! Query operations against one scope
//!
//! Thin, strictly scope-local wrappers used by the facade: each call
//! targets exactly the scope it is given and never reaches into a parent
//! or child. A `None` predicate means "every instance of the type".

use crate::entity::Entity;
use shellac_core::{Predicate, SortKey};
use shellac_store::{Record, Scope};

/// Every instance of `E` in `scope`, sorted by `sort` (store order when
/// empty).
pub fn fetch_all<E: Entity>(scope: &Scope, sort: &[SortKey]) -> Vec<Record> {
    scope.fetch(E::entity_name(), None, sort)
}

/// Instances of `E` in `scope` matching `predicate` (all when `None`),
/// sorted by `sort`.
pub fn fetch_where<E: Entity>(
    scope: &Scope,
    predicate: Option<&Predicate>,
    sort: &[SortKey],
) -> Vec<Record> {
    scope.fetch(E::entity_name(), predicate, sort)
}

/// Count instances of `E` in `scope` matching `predicate`, without
/// materializing record handles.
pub fn count_where<E: Entity>(scope: &Scope, predicate: Option<&Predicate>) -> u64 {
    scope.count(E::entity_name(), predicate)
}

/// Remove every instance of `E` in `scope` matching `predicate` (all when
/// `None`) from the live graph. Idempotent; performs no save.
pub fn delete_all_where<E: Entity>(scope: &Scope, predicate: Option<&Predicate>) -> u64 {
    scope.delete_all(E::entity_name(), predicate)
}
