//! Object stacks: one main scope plus background editing scopes
//!
//! An [`ObjectStack`] owns the scope graph. The main scope is created with
//! the stack and is affinitized to the thread that built it; background
//! scopes are spawned on demand for concurrent editing.
//!
//! Changes made in a background scope become visible in the main scope
//! only through an explicit [`ObjectStack::save`]. The record facade never
//! calls save on the caller's behalf.

use crate::scope::{Scope, ScopeId, ScopeKind};
use dashmap::DashMap;
use shellac_core::{Error, Predicate, Result};
use std::sync::Arc;
use std::thread::ThreadId;
use tracing::debug;

/// Owner of one main scope and any number of background scopes.
pub struct ObjectStack {
    main: Scope,
    background: DashMap<ScopeId, Scope>,
    main_thread: ThreadId,
}

impl ObjectStack {
    /// Build a stack whose main scope is affinitized to the calling thread.
    ///
    /// Call this on the thread that will use the default-scope convenience
    /// entry points; that thread becomes the stack's designated main thread.
    pub fn new() -> Arc<Self> {
        Arc::new(ObjectStack {
            main: Scope::new(ScopeKind::Main),
            background: DashMap::new(),
            main_thread: std::thread::current().id(),
        })
    }

    /// The stack's main scope.
    pub fn main_scope(&self) -> Scope {
        self.main.clone()
    }

    /// The thread the main scope is affinitized to.
    pub fn main_thread(&self) -> ThreadId {
        self.main_thread
    }

    /// Spawn a new background editing scope, registered with this stack.
    pub fn new_background_scope(&self) -> Scope {
        let scope = Scope::new(ScopeKind::Background);
        self.background.insert(scope.id(), scope.clone());
        debug!(scope = %scope.id(), "spawned background scope");
        scope
    }

    /// Number of live background scopes.
    pub fn background_count(&self) -> usize {
        self.background.len()
    }

    /// Deregister a background scope. Its records stay alive through any
    /// handles the caller still holds, but the stack forgets the scope.
    pub fn discard_background_scope(&self, scope: &Scope) {
        self.background.remove(&scope.id());
    }

    /// Merge a background scope's changes into the main scope.
    ///
    /// Reconciliation is by logical id: deletions recorded since the last
    /// save are applied first, then every live background instance either
    /// overwrites its main-scope twin's attributes or is inserted as a new
    /// main-scope instance. Returns the number of records touched.
    ///
    /// Saving the main scope is a no-op returning 0: there is no layer
    /// below it in this store. Saving a scope that does not belong to this
    /// stack is an error.
    pub fn save(&self, scope: &Scope) -> Result<u64> {
        if scope.id() == self.main.id() {
            return Ok(0);
        }
        if !self.background.contains_key(&scope.id()) {
            return Err(Error::Store(format!(
                "scope {} does not belong to this stack",
                scope.id()
            )));
        }

        let mut touched = 0u64;

        for (entity, logical_id) in scope.take_pending_deletes() {
            if let Some(twin) = self.main.find_by_logical_id(entity, logical_id) {
                if self.main.delete(&twin) {
                    touched += 1;
                }
            }
        }

        for (entity, record) in scope.snapshot() {
            match self.main.find_by_logical_id(entity, record.logical_id()) {
                Some(twin) => twin.replace_attributes(record.attributes()),
                None => {
                    let twin = self.main.insert_with_logical_id(entity, record.logical_id());
                    twin.replace_attributes(record.attributes());
                }
            }
            touched += 1;
        }

        debug!(scope = %scope.id(), touched, "saved background scope into main");
        Ok(touched)
    }

    /// Delete matching `entity` records from the main scope.
    ///
    /// This is the purge primitive behind the facade's staleness hook; a
    /// `None` predicate purges nothing (rather than everything), matching
    /// the "nothing is stale by default" contract.
    pub fn purge(&self, entity: &'static str, staleness: Option<&Predicate>) -> u64 {
        match staleness {
            Some(predicate) => self.main.delete_all(entity, Some(predicate)),
            None => 0,
        }
    }
}

impl std::fmt::Debug for ObjectStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStack")
            .field("main", &self.main.id())
            .field("background_scopes", &self.background.len())
            .finish()
    }
}
