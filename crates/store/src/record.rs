//! Live record instances
//!
//! A [`Record`] is a cheaply cloneable handle (`Arc`) to one mutable
//! instance owned by exactly one scope. Identity is scope-relative: the
//! same logical entity is represented by distinct instances in different
//! scopes, related only through their shared [`Record::logical_id`], which
//! save propagation uses to reconcile them.

use crate::scope::{Scope, WeakScope};
use parking_lot::RwLock;
use shellac_core::{AttributeMap, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier of one record instance within its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(Uuid);

impl RecordId {
    fn new() -> Self {
        RecordId(Uuid::new_v4())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct RecordInner {
    id: RecordId,
    logical_id: Uuid,
    entity: &'static str,
    sequence: u64,
    attributes: RwLock<AttributeMap>,
    detached: AtomicBool,
    // Back-reference to the owning scope, set on insertion. Weak so a
    // dangling record handle cannot keep a discarded scope graph alive.
    owner: RwLock<Option<WeakScope>>,
}

/// Handle to a live, mutable record instance.
///
/// Cloning clones the handle, not the instance. Equality compares instance
/// identity, not attributes.
#[derive(Clone)]
pub struct Record {
    inner: Arc<RecordInner>,
}

impl Record {
    pub(crate) fn new(entity: &'static str, sequence: u64) -> Self {
        Self::with_logical_id(entity, sequence, Uuid::new_v4())
    }

    /// Used by save propagation to create the main-scope twin of a
    /// background-scope instance.
    pub(crate) fn with_logical_id(entity: &'static str, sequence: u64, logical_id: Uuid) -> Self {
        Record {
            inner: Arc::new(RecordInner {
                id: RecordId::new(),
                logical_id,
                entity,
                sequence,
                attributes: RwLock::new(AttributeMap::new()),
                detached: AtomicBool::new(false),
                owner: RwLock::new(None),
            }),
        }
    }

    /// Instance identity, unique within the owning scope.
    pub fn id(&self) -> RecordId {
        self.inner.id
    }

    /// Logical identity shared by this instance's twins in other scopes.
    pub fn logical_id(&self) -> Uuid {
        self.inner.logical_id
    }

    /// Entity type name this record belongs to.
    pub fn entity_name(&self) -> &'static str {
        self.inner.entity
    }

    /// Insertion order within the owning scope (monotonically increasing).
    pub fn sequence(&self) -> u64 {
        self.inner.sequence
    }

    /// Read one attribute.
    pub fn get(&self, attribute: &str) -> Option<Value> {
        self.inner.attributes.read().get(attribute).cloned()
    }

    /// Assign one attribute.
    pub fn set(&self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .attributes
            .write()
            .insert(attribute.into(), value.into());
    }

    /// Assign every entry of an attribute map.
    pub fn set_many(&self, attributes: &AttributeMap) {
        let mut guard = self.inner.attributes.write();
        for (name, value) in attributes {
            guard.insert(name.clone(), value.clone());
        }
    }

    /// Replace the whole attribute map (save propagation overwrite).
    pub(crate) fn replace_attributes(&self, attributes: AttributeMap) {
        *self.inner.attributes.write() = attributes;
    }

    /// Snapshot of all attributes.
    pub fn attributes(&self) -> AttributeMap {
        self.inner.attributes.read().clone()
    }

    /// Whether this instance has been removed from its scope's live graph.
    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::Acquire)
    }

    pub(crate) fn mark_detached(&self) {
        self.inner.detached.store(true, Ordering::Release);
    }

    pub(crate) fn set_owner(&self, owner: WeakScope) {
        *self.inner.owner.write() = Some(owner);
    }

    /// The scope currently owning this instance, `None` once detached or
    /// if the scope graph has been dropped.
    pub fn owning_scope(&self) -> Option<Scope> {
        if self.is_detached() {
            return None;
        }
        self.inner
            .owner
            .read()
            .as_ref()
            .and_then(WeakScope::upgrade)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Record {}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.inner.id)
            .field("entity", &self.inner.entity)
            .field("sequence", &self.inner.sequence)
            .field("detached", &self.is_detached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let record = Record::new("artist", 0);
        record.set("name", "Bowie");
        assert_eq!(record.get("name"), Some(Value::from("Bowie")));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_set_many_merges() {
        let record = Record::new("artist", 0);
        record.set("name", "Bowie");

        let mut update = AttributeMap::new();
        update.insert("plays".into(), Value::Int(7));
        record.set_many(&update);

        assert_eq!(record.get("name"), Some(Value::from("Bowie")));
        assert_eq!(record.get("plays"), Some(Value::Int(7)));
    }

    #[test]
    fn test_clone_is_same_instance() {
        let record = Record::new("artist", 0);
        let alias = record.clone();
        alias.set("name", "Eno");
        assert_eq!(record.get("name"), Some(Value::from("Eno")));
        assert_eq!(record, alias);
    }

    #[test]
    fn test_distinct_records_are_not_equal() {
        assert_ne!(Record::new("artist", 0), Record::new("artist", 1));
    }

    #[test]
    fn test_detached_flag() {
        let record = Record::new("artist", 0);
        assert!(!record.is_detached());
        record.mark_detached();
        assert!(record.is_detached());
    }
}
