use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ast::Module;
use crate::util::fast_map::{FastHashMap, FastHashSet, fast_hash_set_new};

/// Where an identity stands. An identity is in exactly one state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Absent,
    Pending,
    Ready,
}

/// Parsed modules keyed by source identity, in first-registration order, plus
/// the identities whose loads are in flight.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    order: Vec<String>,
    modules: FastHashMap<String, Arc<Module>>,
    pending: FastHashSet<String>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            modules: FastHashMap::default(),
            pending: fast_hash_set_new(),
        }
    }

    pub fn state(&self, identity: &str) -> UnitState {
        if self.pending.contains(identity) {
            UnitState::Pending
        } else if self.modules.contains_key(identity) {
            UnitState::Ready
        } else {
            UnitState::Absent
        }
    }

    pub fn get(&self, identity: &str) -> Option<Arc<Module>> {
        self.modules.get(identity).cloned()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.modules.contains_key(identity)
    }

    /// Registers `module` under `identity`, replacing any earlier module while
    /// keeping its original position. A pending load for the same identity is
    /// superseded: its eventual result will be dropped.
    pub fn insert(&mut self, identity: impl Into<String>, module: Module) -> Option<Arc<Module>> {
        let identity = identity.into();
        self.pending.remove(&identity);
        let previous = self.modules.insert(identity.clone(), Arc::new(module));
        if previous.is_none() {
            self.order.push(identity);
        }
        previous
    }

    /// Absent → Pending. Returns `false` (and changes nothing) when the
    /// identity is already pending or ready.
    pub fn begin_load(&mut self, identity: &str) -> bool {
        if self.state(identity) != UnitState::Absent {
            return false;
        }
        self.pending.insert(identity.to_string());
        true
    }

    /// Ends a load. Pending → Ready when a module is supplied, Pending →
    /// Absent otherwise. Returns `false` if the identity was no longer pending,
    /// in which case `module` is discarded.
    pub fn complete_load(&mut self, identity: &str, module: Option<Module>) -> bool {
        if !self.pending.remove(identity) {
            return false;
        }
        if let Some(module) = module {
            self.insert(identity, module);
        }
        true
    }

    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ready modules in first-registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Module>)> {
        self.order
            .iter()
            .filter_map(|identity| self.modules.get(identity).map(|module| (identity.as_str(), module)))
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// The registry behind one lock. Every mutation goes through [`lock`], so no
/// reader sees an identity in two states.
///
/// [`lock`]: SharedRegistry::lock
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry(Arc<Mutex<SourceRegistry>>);

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never held across an await point.
    pub fn lock(&self) -> MutexGuard<'_, SourceRegistry> {
        // Every mutation leaves the registry consistent, so a poisoned lock is
        // still usable.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parse_source;

    fn module(src: &str) -> Module {
        parse_source(src).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let mut registry = SourceRegistry::new();
        assert_eq!(registry.state("a.wren"), UnitState::Absent);

        assert!(registry.begin_load("a.wren"));
        assert_eq!(registry.state("a.wren"), UnitState::Pending);
        assert!(!registry.begin_load("a.wren"));
        assert!(!registry.is_settled());

        assert!(registry.complete_load("a.wren", Some(module("class A {}"))));
        assert_eq!(registry.state("a.wren"), UnitState::Ready);
        assert!(registry.is_settled());
        assert!(!registry.begin_load("a.wren"));
    }

    #[test]
    fn test_failed_load_returns_to_absent() {
        let mut registry = SourceRegistry::new();
        registry.begin_load("gone.wren");
        assert!(registry.complete_load("gone.wren", None));
        assert_eq!(registry.state("gone.wren"), UnitState::Absent);
        assert!(registry.is_settled());
        assert!(registry.begin_load("gone.wren"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut registry = SourceRegistry::new();
        registry.insert("a", module("class A {}"));
        registry.insert("b", module("class B {}"));
        let previous = registry.insert("a", module("class Renamed {}"));
        assert!(previous.is_some());

        let order: Vec<&str> = registry.identities().collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(registry.len(), 2);
        let (_, first) = registry.iter().next().unwrap();
        assert_eq!(first.classes().next().unwrap().name.text, "Renamed");
    }

    #[test]
    fn test_insert_supersedes_pending_load() {
        let mut registry = SourceRegistry::new();
        registry.begin_load("a");
        registry.insert("a", module("class Edited {}"));
        assert_eq!(registry.state("a"), UnitState::Ready);

        assert!(!registry.complete_load("a", Some(module("class Stale {}"))));
        let current = registry.get("a").unwrap();
        assert_eq!(current.classes().next().unwrap().name.text, "Edited");
    }

    #[test]
    fn test_shared_registry_clones_share_state() {
        let shared = SharedRegistry::new();
        let other = shared.clone();
        shared.lock().insert("x", Module::default());
        assert_eq!(other.lock().state("x"), UnitState::Ready);
    }
}
