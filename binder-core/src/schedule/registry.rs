//! Binding Registry
//!
//! Maps binding IDs to their records. Records are stored behind `Arc` so a
//! pass can hold on to one while the registry itself is unlocked and free to
//! change.
//!
//! Iteration follows insertion order until the first removal; removal moves
//! the last record into the freed slot. Passes never depend on the order.

use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::binding::{Binding, BindingId, Reconcile};

/// Ids captured at the start of a pass.
pub(crate) type Snapshot = SmallVec<[BindingId; 64]>;

/// The set of live bindings.
#[derive(Default)]
pub struct Registry {
    records: IndexMap<BindingId, Arc<dyn Reconcile>>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }

    /// Store a binding under a fresh ID.
    ///
    /// Nothing is evaluated here; the first observation happens on the next
    /// pass.
    pub fn register<T>(&mut self, binding: Binding<T>) -> BindingId
    where
        T: Send + 'static,
    {
        let id = BindingId::next();
        self.records.insert(id, Arc::new(binding.into_record(id)));
        id
    }

    /// Remove a binding. Returns whether it was present.
    ///
    /// A pass that already holds the record sees it as unbound from here on.
    pub fn unregister(&mut self, id: BindingId) -> bool {
        match self.records.swap_remove(&id) {
            Some(record) => {
                record.mark_unbound();
                true
            }
            None => false,
        }
    }

    /// Check whether a binding is registered.
    pub fn contains(&self, id: BindingId) -> bool {
        self.records.contains_key(&id)
    }

    pub(crate) fn get(&self, id: BindingId) -> Option<Arc<dyn Reconcile>> {
        self.records.get(&id).cloned()
    }

    /// Ids of every binding registered right now, in iteration order.
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.records.keys().copied().collect()
    }

    /// Get the number of registered bindings.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.len())
            .finish()
    }
}
