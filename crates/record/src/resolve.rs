//! Find-or-create resolution
//!
//! Both resolvers run their fetch and their conditional create inside one
//! synchronous block on the global serial lane. Two concurrent callers
//! therefore cannot both miss the fetch and both create: whichever block
//! runs second sees the first one's record.
//!
//! Plain queries and unconditional creates are deliberately NOT routed
//! through the lane; only find-or-create needs the atomicity.

use crate::atomic::AtomicExecutor;
use crate::entity::Entity;
use shellac_core::{AttributeMap, Error, Predicate, Result, Value};
use shellac_store::{Record, Scope};
use tracing::{error, warn};

/// Resolve or create the single instance of `E` with `key_value` for its
/// declared primary-key attribute.
///
/// ## Errors
///
/// - `MissingPrimaryKey`: `E` declares no primary-key attribute
/// - `ReentrantAtomic`: called from inside an atomic block
///
/// Returns `Ok(None)` when nothing matches and `create_if_missing` is
/// false. If the store already holds several matches (an external
/// invariant violation), the match with the lowest insertion sequence is
/// returned, deterministically, and a warning is logged; the store is not
/// repaired.
pub fn resolve_by_primary_key<E: Entity>(
    key_value: impl Into<Value>,
    create_if_missing: bool,
    scope: &Scope,
) -> Result<Option<Record>> {
    let Some(key) = E::primary_key() else {
        error!(
            entity = E::entity_name(),
            "primary-key lookup on a type with no declared primary key"
        );
        return Err(Error::MissingPrimaryKey {
            entity: E::entity_name(),
        });
    };

    let key_value = key_value.into();
    let predicate = Predicate::Eq(key.to_string(), key_value.clone());
    let scope = scope.clone();

    AtomicExecutor::global().run_sync(move || {
        let mut matches = scope.fetch(E::entity_name(), Some(&predicate), &[]);
        if matches.len() > 1 {
            warn!(
                entity = E::entity_name(),
                key,
                count = matches.len(),
                "multiple records share a primary-key value; returning the oldest"
            );
            matches.sort_by_key(Record::sequence);
        }
        if let Some(found) = matches.into_iter().next() {
            return Some(found);
        }
        if !create_if_missing {
            return None;
        }

        let record = scope.insert_new(E::entity_name());
        record.set(key, key_value);
        Some(record)
    })
}

/// Resolve or create the single instance of `E` matching every entry of
/// `attributes`. On creation, every entry is assigned to the new record
/// before it is returned.
///
/// ## Errors
///
/// - `EmptyAttributeMap`: `attributes` is empty
/// - `ReentrantAtomic`: called from inside an atomic block
pub fn resolve_by_attributes<E: Entity>(
    attributes: &AttributeMap,
    create_if_missing: bool,
    scope: &Scope,
) -> Result<Option<Record>> {
    if attributes.is_empty() {
        error!(
            entity = E::entity_name(),
            "attribute match with an empty attribute map"
        );
        return Err(Error::EmptyAttributeMap {
            entity: E::entity_name(),
        });
    }

    let predicate = Predicate::matching_all(attributes);
    let attributes = attributes.clone();
    let scope = scope.clone();

    AtomicExecutor::global().run_sync(move || {
        let matches = scope.fetch(E::entity_name(), Some(&predicate), &[]);
        // Store order is insertion order: the first match is the oldest.
        if let Some(found) = matches.into_iter().next() {
            return Some(found);
        }
        if !create_if_missing {
            return None;
        }

        let record = scope.insert_new(E::entity_name());
        record.set_many(&attributes);
        Some(record)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellac_store::ObjectStack;

    struct Artist;

    impl Entity for Artist {
        fn entity_name() -> &'static str {
            "artist"
        }

        fn primary_key() -> Option<&'static str> {
            Some("remote_id")
        }
    }

    struct NoKey;

    impl Entity for NoKey {
        fn entity_name() -> &'static str {
            "no_key"
        }
    }

    fn attrs(entries: &[(&str, Value)]) -> AttributeMap {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_lookup_miss_without_create() {
        let stack = ObjectStack::new();
        let scope = stack.main_scope();
        let found = resolve_by_primary_key::<Artist>(Value::Int(7), false, &scope).unwrap();
        assert!(found.is_none());
        assert_eq!(scope.count("artist", None), 0);
    }

    #[test]
    fn test_create_then_find_returns_same_instance() {
        let stack = ObjectStack::new();
        let scope = stack.main_scope();

        let created = resolve_by_primary_key::<Artist>(Value::Int(7), true, &scope)
            .unwrap()
            .unwrap();
        assert_eq!(created.get("remote_id"), Some(Value::Int(7)));

        let found = resolve_by_primary_key::<Artist>(Value::Int(7), false, &scope)
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
        assert_eq!(scope.count("artist", None), 1);
    }

    #[test]
    fn test_missing_primary_key_is_configuration_error() {
        let stack = ObjectStack::new();
        let scope = stack.main_scope();
        let result = resolve_by_primary_key::<NoKey>(Value::Int(1), true, &scope);
        assert!(matches!(
            result,
            Err(Error::MissingPrimaryKey { entity: "no_key" })
        ));
        assert_eq!(scope.count("no_key", None), 0);
    }

    #[test]
    fn test_duplicate_matches_resolve_to_oldest() {
        let stack = ObjectStack::new();
        let scope = stack.main_scope();

        // Pre-existing corruption: two records with the same key value
        let first = scope.insert_new("artist");
        first.set("remote_id", Value::Int(7));
        let second = scope.insert_new("artist");
        second.set("remote_id", Value::Int(7));

        let resolved = resolve_by_primary_key::<Artist>(Value::Int(7), false, &scope)
            .unwrap()
            .unwrap();
        assert_eq!(resolved, first);

        // Deterministic: the same record every time
        let again = resolve_by_primary_key::<Artist>(Value::Int(7), false, &scope)
            .unwrap()
            .unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn test_attribute_match_is_idempotent() {
        let stack = ObjectStack::new();
        let scope = stack.main_scope();
        let filter = attrs(&[("name", Value::from("Bowie"))]);

        let first = resolve_by_attributes::<Artist>(&filter, true, &scope)
            .unwrap()
            .unwrap();
        let second = resolve_by_attributes::<Artist>(&filter, true, &scope)
            .unwrap()
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(scope.count("artist", None), 1);
    }

    #[test]
    fn test_attribute_create_assigns_every_entry() {
        let stack = ObjectStack::new();
        let scope = stack.main_scope();
        let filter = attrs(&[("name", Value::from("Bowie")), ("plays", Value::Int(3))]);

        let record = resolve_by_attributes::<Artist>(&filter, true, &scope)
            .unwrap()
            .unwrap();
        assert_eq!(record.get("name"), Some(Value::from("Bowie")));
        assert_eq!(record.get("plays"), Some(Value::Int(3)));
    }

    #[test]
    fn test_empty_attribute_map_is_configuration_error() {
        let stack = ObjectStack::new();
        let scope = stack.main_scope();
        let result = resolve_by_attributes::<Artist>(&AttributeMap::new(), true, &scope);
        assert!(matches!(
            result,
            Err(Error::EmptyAttributeMap { entity: "artist" })
        ));
    }

    #[test]
    fn test_attribute_match_ignores_partial_overlap() {
        let stack = ObjectStack::new();
        let scope = stack.main_scope();

        let partial = scope.insert_new("artist");
        partial.set("name", "Bowie");

        let filter = attrs(&[("name", Value::from("Bowie")), ("plays", Value::Int(3))]);
        let record = resolve_by_attributes::<Artist>(&filter, true, &scope)
            .unwrap()
            .unwrap();
        assert_ne!(record, partial);
        assert_eq!(scope.count("artist", None), 2);
    }
}
