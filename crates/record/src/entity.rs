//! The per-type capability interface
//!
//! Every persisted entity type implements [`Entity`] once; the whole facade
//! is generic over it. The three optional hooks mirror what a type can
//! customize: which stack it stores into, which attribute uniquely
//! identifies it, and which of its records an external purge may discard.

use shellac_core::{Predicate, Result};
use shellac_store::ObjectStack;
use std::sync::Arc;

/// Capability interface implemented by each persisted entity type.
///
/// ## Contract
///
/// | Hook | Default | Consumed by |
/// |------|---------|-------------|
/// | `entity_name` | required | every operation |
/// | `primary_key` | `None` | [`crate::facade::ActiveRecord::with_primary_key`] (errors without it) |
/// | `staleness_predicate` | `None` (nothing is stale) | [`crate::facade::ActiveRecord::purge_stale`] |
/// | `stack` | the installed main stack | default-scope entry points |
pub trait Entity: Send + Sync + 'static {
    /// Name of this entity type in the store.
    fn entity_name() -> &'static str;

    /// Attribute uniquely identifying records of this type, if declared.
    ///
    /// Primary-key find-or-create is a configuration error without it.
    fn primary_key() -> Option<&'static str> {
        None
    }

    /// Predicate selecting records an external purge may discard.
    ///
    /// `None` means no record of this type is ever considered stale.
    fn staleness_predicate() -> Option<Predicate> {
        None
    }

    /// The object stack this type stores into.
    ///
    /// Defaults to the process-wide installed main stack; override to pin a
    /// type to a different stack.
    fn stack() -> Result<Arc<ObjectStack>> {
        crate::context::main_stack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Entity for Plain {
        fn entity_name() -> &'static str {
            "plain"
        }
    }

    #[test]
    fn test_hook_defaults() {
        assert_eq!(Plain::entity_name(), "plain");
        assert_eq!(Plain::primary_key(), None);
        assert!(Plain::staleness_predicate().is_none());
    }
}
