//! The public active-record surface
//!
//! [`ActiveRecord`] is implemented for every [`Entity`] via a blanket impl;
//! entity types get the whole surface by implementing `Entity` alone.
//!
//! Each operation comes in two variants:
//! - the default-scope form resolves to the type's stack's main scope and
//!   returns `Err(NotMainThread)` off the designated main thread;
//! - the `_in` form takes an explicit scope, runs from any thread, and
//!   performs no affinity check.
//!
//! Creation is unconditional (never routed through find-or-create), and no
//! operation here ever saves: persistence of scope changes is the caller's
//! explicit [`shellac_store::ObjectStack::save`].

use crate::context;
use crate::entity::Entity;
use crate::query;
use crate::resolve;
use shellac_core::{AttributeMap, Predicate, Result, SortKey, Value};
use shellac_store::{Record, Scope};
use tracing::debug;

/// Active-record operations, available on every [`Entity`] type.
pub trait ActiveRecord: Entity + Sized {
    /// Create a new instance in the main scope.
    fn create() -> Result<Record> {
        context::require_main_thread::<Self>("create")?;
        let scope = context::resolve_scope::<Self>(None)?;
        Ok(scope.insert_new(Self::entity_name()))
    }

    /// Create a new instance in the given scope.
    fn create_in(scope: &Scope) -> Record {
        scope.insert_new(Self::entity_name())
    }

    /// Find the instance with the given primary-key value in the main
    /// scope, creating it when `create_if_missing` and absent.
    fn with_primary_key(
        key_value: impl Into<Value>,
        create_if_missing: bool,
    ) -> Result<Option<Record>> {
        context::require_main_thread::<Self>("with_primary_key")?;
        let scope = context::resolve_scope::<Self>(None)?;
        resolve::resolve_by_primary_key::<Self>(key_value, create_if_missing, &scope)
    }

    /// Find the instance with the given primary-key value in the given
    /// scope, creating it when `create_if_missing` and absent.
    fn with_primary_key_in(
        key_value: impl Into<Value>,
        create_if_missing: bool,
        scope: &Scope,
    ) -> Result<Option<Record>> {
        resolve::resolve_by_primary_key::<Self>(key_value, create_if_missing, scope)
    }

    /// Find the instance matching every attribute entry in the main scope,
    /// creating and initializing it when `create_if_missing` and absent.
    fn with_attributes(
        attributes: &AttributeMap,
        create_if_missing: bool,
    ) -> Result<Option<Record>> {
        context::require_main_thread::<Self>("with_attributes")?;
        let scope = context::resolve_scope::<Self>(None)?;
        resolve::resolve_by_attributes::<Self>(attributes, create_if_missing, &scope)
    }

    /// Find the instance matching every attribute entry in the given scope,
    /// creating and initializing it when `create_if_missing` and absent.
    fn with_attributes_in(
        attributes: &AttributeMap,
        create_if_missing: bool,
        scope: &Scope,
    ) -> Result<Option<Record>> {
        resolve::resolve_by_attributes::<Self>(attributes, create_if_missing, scope)
    }

    /// Every instance in the main scope, in store order.
    fn all() -> Result<Vec<Record>> {
        context::require_main_thread::<Self>("all")?;
        let scope = context::resolve_scope::<Self>(None)?;
        Ok(query::fetch_all::<Self>(&scope, &[]))
    }

    /// Every instance in the given scope, in store order.
    fn all_in(scope: &Scope) -> Vec<Record> {
        query::fetch_all::<Self>(scope, &[])
    }

    /// Every instance in the main scope, sorted.
    fn all_sorted(sort: &[SortKey]) -> Result<Vec<Record>> {
        context::require_main_thread::<Self>("all_sorted")?;
        let scope = context::resolve_scope::<Self>(None)?;
        Ok(query::fetch_all::<Self>(&scope, sort))
    }

    /// Every instance in the given scope, sorted.
    fn all_sorted_in(sort: &[SortKey], scope: &Scope) -> Vec<Record> {
        query::fetch_all::<Self>(scope, sort)
    }

    /// Instances matching `predicate` in the main scope (`None` = all),
    /// optionally sorted.
    fn find_where(predicate: Option<&Predicate>, sort: &[SortKey]) -> Result<Vec<Record>> {
        context::require_main_thread::<Self>("find_where")?;
        let scope = context::resolve_scope::<Self>(None)?;
        Ok(query::fetch_where::<Self>(&scope, predicate, sort))
    }

    /// Instances matching `predicate` in the given scope (`None` = all),
    /// optionally sorted.
    fn find_where_in(
        predicate: Option<&Predicate>,
        sort: &[SortKey],
        scope: &Scope,
    ) -> Vec<Record> {
        query::fetch_where::<Self>(scope, predicate, sort)
    }

    /// Number of instances in the main scope.
    fn count() -> Result<u64> {
        context::require_main_thread::<Self>("count")?;
        let scope = context::resolve_scope::<Self>(None)?;
        Ok(query::count_where::<Self>(&scope, None))
    }

    /// Number of instances in the given scope.
    fn count_in(scope: &Scope) -> u64 {
        query::count_where::<Self>(scope, None)
    }

    /// Number of instances matching `predicate` in the main scope.
    fn count_where(predicate: Option<&Predicate>) -> Result<u64> {
        context::require_main_thread::<Self>("count_where")?;
        let scope = context::resolve_scope::<Self>(None)?;
        Ok(query::count_where::<Self>(&scope, predicate))
    }

    /// Number of instances matching `predicate` in the given scope.
    fn count_where_in(predicate: Option<&Predicate>, scope: &Scope) -> u64 {
        query::count_where::<Self>(scope, predicate)
    }

    /// Remove every instance from the main scope's live graph.
    fn delete_all() -> Result<u64> {
        context::require_main_thread::<Self>("delete_all")?;
        let scope = context::resolve_scope::<Self>(None)?;
        Ok(query::delete_all_where::<Self>(&scope, None))
    }

    /// Remove every instance from the given scope's live graph.
    fn delete_all_in(scope: &Scope) -> u64 {
        query::delete_all_where::<Self>(scope, None)
    }

    /// Remove every matching instance from the main scope's live graph.
    fn delete_all_where(predicate: Option<&Predicate>) -> Result<u64> {
        context::require_main_thread::<Self>("delete_all_where")?;
        let scope = context::resolve_scope::<Self>(None)?;
        Ok(query::delete_all_where::<Self>(&scope, predicate))
    }

    /// Remove every matching instance from the given scope's live graph.
    fn delete_all_where_in(predicate: Option<&Predicate>, scope: &Scope) -> u64 {
        query::delete_all_where::<Self>(scope, predicate)
    }

    /// Purge stale instances from the type's stack's main scope, per
    /// [`Entity::staleness_predicate`]. With the default predicate
    /// (`None`), nothing is purged.
    fn purge_stale() -> Result<u64> {
        let stack = Self::stack()?;
        let purged = stack.purge(Self::entity_name(), Self::staleness_predicate().as_ref());
        if purged > 0 {
            debug!(entity = Self::entity_name(), purged, "purged stale records");
        }
        Ok(purged)
    }
}

impl<E: Entity> ActiveRecord for E {}

/// Remove one instance from whatever scope currently owns it.
///
/// Returns `false` (a no-op, not an error) when the instance is already
/// detached. Performs no save.
pub fn delete(record: &Record) -> bool {
    match record.owning_scope() {
        Some(scope) => scope.delete(record),
        None => false,
    }
}
