// SPDX-License-Identifier: GPL-3.0-only

//! Process-wide owner lookup, explicitly constructed and
//! test-injectable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::warn;

use crate::measure::OwnerShared;

/// Identifier of the configuration scope a measure belongs to (the
/// skin/window handle analog). Dependents only resolve owners within
/// their own scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u64);

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Mapping from `(scope, name)` to the owner's shared state.
///
/// Lookups race with registration and teardown of unrelated measures,
/// so the map sits behind a mutex. Entries hold weak references: a
/// disposed owner can never be revived through a stale binding.
#[derive(Default)]
pub struct OwnerRegistry {
    entries: Mutex<HashMap<(ScopeId, String), Weak<OwnerShared>>>,
}

impl OwnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `owner` under `(scope, name)`. A second live owner under
    /// the same pair is a configuration error; the last writer wins.
    pub fn register(&self, scope: ScopeId, name: &str, owner: &Arc<OwnerShared>) {
        let mut entries = self.entries.lock().expect("owner registry poisoned");
        let previous = entries.insert((scope, name.to_string()), Arc::downgrade(owner));
        if previous.is_some_and(|prev| prev.upgrade().is_some()) {
            warn!(%scope, name, "duplicate owner registration, last writer wins");
        }
    }

    /// Remove the entry for `(scope, name)` if it still refers to
    /// `owner`. After a duplicate registration, disposing the earlier
    /// owner must not tear down the later one's entry.
    pub fn unregister(&self, scope: ScopeId, name: &str, owner: &Arc<OwnerShared>) {
        let mut entries = self.entries.lock().expect("owner registry poisoned");
        let key = (scope, name.to_string());
        if entries
            .get(&key)
            .is_some_and(|current| Weak::ptr_eq(current, &Arc::downgrade(owner)))
        {
            entries.remove(&key);
        }
    }

    /// Resolve an owner, or `None` when the name is unbound or the
    /// owner has already been disposed.
    pub fn find(&self, scope: ScopeId, name: &str) -> Option<Arc<OwnerShared>> {
        let entries = self.entries.lock().expect("owner registry poisoned");
        entries.get(&(scope, name.to_string()))?.upgrade()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_resolves_registered_owner_by_scope_and_name() {
        let registry = OwnerRegistry::new();
        let owner = Arc::new(OwnerShared::new());
        registry.register(ScopeId(1), "drives", &owner);

        let found = registry.find(ScopeId(1), "drives").unwrap();
        assert!(Arc::ptr_eq(&found, &owner));

        assert!(registry.find(ScopeId(2), "drives").is_none());
        assert!(registry.find(ScopeId(1), "other").is_none());
    }

    #[test]
    fn unregister_removes_only_the_matching_owner() {
        let registry = OwnerRegistry::new();
        let first = Arc::new(OwnerShared::new());
        let second = Arc::new(OwnerShared::new());
        registry.register(ScopeId(1), "drives", &first);
        registry.register(ScopeId(1), "drives", &second);

        // Disposing the shadowed owner leaves the live entry alone.
        registry.unregister(ScopeId(1), "drives", &first);
        let found = registry.find(ScopeId(1), "drives").unwrap();
        assert!(Arc::ptr_eq(&found, &second));

        registry.unregister(ScopeId(1), "drives", &second);
        assert!(registry.find(ScopeId(1), "drives").is_none());
    }

    #[test]
    fn dropped_owner_is_not_resolvable() {
        let registry = OwnerRegistry::new();
        let owner = Arc::new(OwnerShared::new());
        registry.register(ScopeId(1), "drives", &owner);
        drop(owner);

        assert!(registry.find(ScopeId(1), "drives").is_none());
    }
}
