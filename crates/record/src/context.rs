//! Scope resolution and the process-wide main stack handle
//!
//! The original ambient-singleton default stack is replaced by an explicit
//! process-wide handle with documented init/teardown:
//! [`install_main_stack`] / [`uninstall_main_stack`]. Default-scope entry
//! points resolve through it; everything else takes an explicit scope.
//!
//! Thread affinity is enforced as a `Result`, never as a silent no-op: a
//! default-scope entry point called off the stack's main thread gets
//! `Err(NotMainThread)` naming the offending operation.

use crate::entity::Entity;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use shellac_core::{Error, Result};
use shellac_store::{ObjectStack, Scope};
use std::sync::Arc;
use tracing::{debug, error};

static MAIN_STACK: Lazy<RwLock<Option<Arc<ObjectStack>>>> = Lazy::new(|| RwLock::new(None));

/// Install the process-wide main stack.
///
/// The stack's own main thread (the thread that built it) stays the
/// affinity target; installing from another thread does not re-home it.
/// Replaces any previously installed stack.
pub fn install_main_stack(stack: Arc<ObjectStack>) {
    debug!("installing main object stack");
    *MAIN_STACK.write() = Some(stack);
}

/// Tear down the process-wide main stack, returning it if one was installed.
pub fn uninstall_main_stack() -> Option<Arc<ObjectStack>> {
    debug!("uninstalling main object stack");
    MAIN_STACK.write().take()
}

/// The installed main stack, or `Err(MainStackUnset)`.
pub fn main_stack() -> Result<Arc<ObjectStack>> {
    MAIN_STACK
        .read()
        .clone()
        .ok_or(Error::MainStackUnset)
}

/// Resolve the scope an operation targets: the explicit scope when given,
/// else the entity type's stack's main scope.
pub fn resolve_scope<E: Entity>(explicit: Option<&Scope>) -> Result<Scope> {
    match explicit {
        Some(scope) => Ok(scope.clone()),
        None => Ok(E::stack()?.main_scope()),
    }
}

/// Require that the calling thread is the designated main thread of the
/// entity type's stack. Applied only to default-scope convenience entry
/// points; explicit-scope variants never check.
pub fn require_main_thread<E: Entity>(operation: &'static str) -> Result<()> {
    let stack = E::stack()?;
    if std::thread::current().id() != stack.main_thread() {
        error!(
            operation,
            entity = E::entity_name(),
            "main-scope entry point called off the main thread"
        );
        return Err(Error::NotMainThread { operation });
    }
    Ok(())
}

// The main-stack handle is process-wide; tests touching it must not
// interleave.
#[cfg(test)]
pub(crate) static TEST_HANDLE_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());
