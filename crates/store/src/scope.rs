//! Scopes: isolated live object graphs
//!
//! A [`Scope`] owns a per-entity-type graph of live [`Record`] instances.
//! All operations here are strictly local to the scope; the parent/child
//! relationship between the main scope and background scopes is visible
//! only to [`crate::ObjectStack::save`].
//!
//! Deletion removes an instance from the live graph and marks the handle
//! detached. It never flushes anything anywhere: durability (such as it is
//! for an in-memory store) is the stack's explicit save.

use crate::record::Record;
use parking_lot::{Mutex, RwLock};
use shellac_core::{Predicate, SortKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;
use uuid::Uuid;

/// Unique identifier of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(Uuid);

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a scope is the stack's main scope or a background child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The single main scope of a stack, affinitized to the stack's
    /// designated main thread for convenience entry points.
    Main,
    /// A background editing scope; changes reach the main scope only via
    /// an explicit save.
    Background,
}

struct ScopeInner {
    id: ScopeId,
    kind: ScopeKind,
    graph: RwLock<HashMap<&'static str, Vec<Record>>>,
    next_sequence: AtomicU64,
    // Logical ids deleted since the last save, consumed by propagation.
    pending_deletes: Mutex<Vec<(&'static str, Uuid)>>,
}

/// Handle to one scope of an [`crate::ObjectStack`].
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    pub(crate) fn new(kind: ScopeKind) -> Self {
        Scope {
            inner: Arc::new(ScopeInner {
                id: ScopeId(Uuid::new_v4()),
                kind,
                graph: RwLock::new(HashMap::new()),
                next_sequence: AtomicU64::new(0),
                pending_deletes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Scope identity.
    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Whether this is the main scope or a background scope.
    pub fn kind(&self) -> ScopeKind {
        self.inner.kind
    }

    /// Create a new empty record instance of `entity` in this scope.
    pub fn insert_new(&self, entity: &'static str) -> Record {
        let sequence = self.inner.next_sequence.fetch_add(1, Ordering::Relaxed);
        let record = Record::new(entity, sequence);
        self.insert_record(entity, record.clone());
        record
    }

    /// Insert a record carrying an existing logical id (save propagation).
    pub(crate) fn insert_with_logical_id(&self, entity: &'static str, logical_id: Uuid) -> Record {
        let sequence = self.inner.next_sequence.fetch_add(1, Ordering::Relaxed);
        let record = Record::with_logical_id(entity, sequence, logical_id);
        self.insert_record(entity, record.clone());
        record
    }

    fn insert_record(&self, entity: &'static str, record: Record) {
        debug!(entity, scope = %self.inner.id, record = %record.id(), "inserted record");
        record.set_owner(self.downgrade());
        self.inner
            .graph
            .write()
            .entry(entity)
            .or_default()
            .push(record);
    }

    pub(crate) fn downgrade(&self) -> WeakScope {
        WeakScope(Arc::downgrade(&self.inner))
    }

    /// Fetch every instance of `entity` matching `predicate` (all when
    /// `None`), sorted by `sort` (store order when empty).
    pub fn fetch(
        &self,
        entity: &str,
        predicate: Option<&Predicate>,
        sort: &[SortKey],
    ) -> Vec<Record> {
        let graph = self.inner.graph.read();
        let mut matches: Vec<Record> = graph
            .get(entity)
            .into_iter()
            .flatten()
            .filter(|record| match predicate {
                Some(predicate) => predicate.matches(&record.attributes()),
                None => true,
            })
            .cloned()
            .collect();
        drop(graph);

        if !sort.is_empty() {
            // Stable sort: equal records keep their insertion order.
            matches.sort_by(|a, b| SortKey::compare(sort, &a.attributes(), &b.attributes()));
        }
        matches
    }

    /// Count instances of `entity` matching `predicate` without
    /// materializing record handles (single pass under the read lock).
    pub fn count(&self, entity: &str, predicate: Option<&Predicate>) -> u64 {
        let graph = self.inner.graph.read();
        graph
            .get(entity)
            .into_iter()
            .flatten()
            .filter(|record| match predicate {
                Some(predicate) => predicate.matches(&record.attributes()),
                None => true,
            })
            .count() as u64
    }

    /// Remove one instance from the live graph.
    ///
    /// Returns `false` (a no-op, not an error) when the instance is already
    /// detached or was never part of this scope.
    pub fn delete(&self, record: &Record) -> bool {
        if record.is_detached() {
            return false;
        }

        let mut graph = self.inner.graph.write();
        let Some(records) = graph.get_mut(record.entity_name()) else {
            return false;
        };
        let Some(position) = records.iter().position(|candidate| candidate == record) else {
            return false;
        };

        let removed = records.remove(position);
        removed.mark_detached();
        drop(graph);

        debug!(
            entity = record.entity_name(),
            scope = %self.inner.id,
            record = %record.id(),
            "deleted record"
        );
        self.note_delete(record.entity_name(), record.logical_id());
        true
    }

    /// Remove every instance of `entity` matching `predicate` (all when
    /// `None`). Returns the number removed; removing nothing is a no-op.
    pub fn delete_all(&self, entity: &'static str, predicate: Option<&Predicate>) -> u64 {
        let mut graph = self.inner.graph.write();
        let Some(records) = graph.get_mut(entity) else {
            return 0;
        };

        let mut removed = Vec::new();
        records.retain(|record| {
            let matches = match predicate {
                Some(predicate) => predicate.matches(&record.attributes()),
                None => true,
            };
            if matches {
                record.mark_detached();
                removed.push(record.logical_id());
            }
            !matches
        });
        drop(graph);

        if !removed.is_empty() {
            debug!(entity, scope = %self.inner.id, count = removed.len(), "deleted records");
            if self.inner.kind != ScopeKind::Main {
                let mut pending = self.inner.pending_deletes.lock();
                pending.extend(removed.iter().map(|logical_id| (entity, *logical_id)));
            }
        }
        removed.len() as u64
    }

    // Only background scopes have a save consumer for the deletion ledger;
    // the main scope is the propagation target and must not accumulate one.
    fn note_delete(&self, entity: &'static str, logical_id: Uuid) {
        if self.inner.kind == ScopeKind::Main {
            return;
        }
        self.inner.pending_deletes.lock().push((entity, logical_id));
    }

    /// Drain the logical ids deleted since the last save.
    pub(crate) fn take_pending_deletes(&self) -> Vec<(&'static str, Uuid)> {
        std::mem::take(&mut *self.inner.pending_deletes.lock())
    }

    /// Snapshot of the live graph as (entity, record) pairs, for save
    /// propagation.
    pub(crate) fn snapshot(&self) -> Vec<(&'static str, Record)> {
        let graph = self.inner.graph.read();
        graph
            .iter()
            .flat_map(|(entity, records)| records.iter().map(|record| (*entity, record.clone())))
            .collect()
    }

    /// Find the live instance with the given logical id, if any.
    pub(crate) fn find_by_logical_id(&self, entity: &str, logical_id: Uuid) -> Option<Record> {
        let graph = self.inner.graph.read();
        graph
            .get(entity)?
            .iter()
            .find(|record| record.logical_id() == logical_id)
            .cloned()
    }
}

/// Weak handle a record keeps to its owning scope.
pub(crate) struct WeakScope(Weak<ScopeInner>);

impl WeakScope {
    pub(crate) fn upgrade(&self) -> Option<Scope> {
        self.0.upgrade().map(|inner| Scope { inner })
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .finish()
    }
}
