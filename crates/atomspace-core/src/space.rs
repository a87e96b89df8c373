//! # AtomSpace
//!
//! The thread-safe store handed to collaborators.
//!
//! - Structural mutations (type registration, insert, remove) take the write
//!   lock, so readers never see a half-updated index
//! - Reads and queries take the read lock and run in parallel
//! - Truth-value updates take only the read lock plus the atom's own cell,
//!   so they never wait on each other unless they touch the same atom
//!
//! There is no global instance. Create an `AtomSpace` and share it (for
//! example behind an `Arc`) with whatever needs it.
//!
//! ## Lock discipline
//!
//! A [`Matches`] iterator or a [`Snapshot`] holds the read lock until it is
//! dropped. Calling a mutating method from the same thread while one is alive
//! deadlocks; drop it first, or use the snapshot's own methods.

use crate::metrics::StoreMetrics;
use crate::pattern::matcher::StoreRef;
use crate::pattern::{Matches, Pattern, compile};
use crate::query::Query;
use crate::store::{AtomTable, HypergraphStore};
use crate::truth::TruthValue;
use crate::types::{Atom, AtomSpaceError, AtomSpec, Handle, InsertOutcome, TypeEntry, TypeId};
use std::ops::Deref;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Concurrent hypergraph store.
#[derive(Debug, Default)]
pub struct AtomSpace {
    table: RwLock<AtomTable>,
}

impl AtomSpace {
    /// Create an empty store with the built-in types registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, AtomTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AtomTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // TYPES
    // =========================================================================

    /// Register a type under `parent` (defaults to `Atom`).
    pub fn register_type(&self, name: &str, parent: Option<&str>) -> Result<TypeId, AtomSpaceError> {
        self.write().register_type(name, parent)
    }

    /// All registered types in registration order.
    #[must_use]
    pub fn types(&self) -> Vec<TypeEntry> {
        self.read().types().iter().cloned().collect()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Insert an atom description and return its canonical handle.
    pub fn insert(&self, spec: &AtomSpec, truth: Option<TruthValue>) -> Result<Handle, AtomSpaceError> {
        Ok(self.insert_with_outcome(spec, truth)?.handle())
    }

    /// Insert an atom description, reporting whether it was new.
    pub fn insert_with_outcome(
        &self,
        spec: &AtomSpec,
        truth: Option<TruthValue>,
    ) -> Result<InsertOutcome, AtomSpaceError> {
        self.write().insert(spec, truth)
    }

    pub fn add_node(&self, atom_type: &str, name: &str) -> Result<Handle, AtomSpaceError> {
        self.write().add_node(atom_type, name)
    }

    pub fn add_link(&self, atom_type: &str, outgoing: &[Handle]) -> Result<Handle, AtomSpaceError> {
        self.write().add_link(atom_type, outgoing)
    }

    /// Remove an atom nothing references.
    pub fn remove(&self, handle: Handle) -> Result<Atom, AtomSpaceError> {
        self.write().remove(handle)
    }

    /// Remove an atom and every link that transitively references it.
    pub fn remove_cascade(&self, handle: Handle) -> Result<Vec<Handle>, AtomSpaceError> {
        self.write().remove_cascade(handle)
    }

    // =========================================================================
    // TRUTH VALUES
    // =========================================================================

    /// Revise an atom's truth value with a new observation (or set it if
    /// unknown). Returns the resulting value.
    pub fn set_truth_value(
        &self,
        handle: Handle,
        strength: f64,
        confidence: f64,
    ) -> Result<TruthValue, AtomSpaceError> {
        let observation = TruthValue::new(strength, confidence)?;
        self.read().revise_truth(handle, observation)
    }

    /// Overwrite an atom's truth value without revision.
    pub fn replace_truth_value(
        &self,
        handle: Handle,
        value: TruthValue,
    ) -> Result<Option<TruthValue>, AtomSpaceError> {
        self.read().replace_truth(handle, Some(value))
    }

    /// Return an atom's truth value to "unknown".
    pub fn clear_truth_value(&self, handle: Handle) -> Result<Option<TruthValue>, AtomSpaceError> {
        self.read().replace_truth(handle, None)
    }

    pub fn get_truth_value(&self, handle: Handle) -> Result<Option<TruthValue>, AtomSpaceError> {
        self.read().get_truth(handle)
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn get(&self, handle: Handle) -> Result<Atom, AtomSpaceError> {
        self.read().get(handle)
    }

    pub fn get_incoming(&self, handle: Handle) -> Result<Vec<Handle>, AtomSpaceError> {
        self.read().get_incoming(handle)
    }

    pub fn get_by_type(
        &self,
        atom_type: &str,
        include_subtypes: bool,
    ) -> Result<Vec<Handle>, AtomSpaceError> {
        self.read().get_by_type(atom_type, include_subtypes)
    }

    pub fn find_node(&self, atom_type: &str, name: &str) -> Result<Option<Handle>, AtomSpaceError> {
        self.read().find_node(atom_type, name)
    }

    pub fn find_link(
        &self,
        atom_type: &str,
        outgoing: &[Handle],
    ) -> Result<Option<Handle>, AtomSpaceError> {
        self.read().find_link(atom_type, outgoing)
    }

    /// Name of a registered type.
    #[must_use]
    pub fn type_name(&self, id: TypeId) -> Option<String> {
        self.read().type_name(id).map(str::to_string)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Run a pattern with no caps.
    pub fn query(&self, pattern: &Pattern) -> Result<Matches<'_>, AtomSpaceError> {
        self.run(&Query::new(pattern.clone()))
    }

    /// Compile and start a query.
    ///
    /// The returned iterator holds the read lock, so the structure it searches
    /// is the structure as of this call.
    pub fn run(&self, query: &Query) -> Result<Matches<'_>, AtomSpaceError> {
        let guard = self.read();
        let plan = compile(&*guard, &query.pattern)?;
        Ok(Matches::new(StoreRef::Locked(guard), plan, query.limits))
    }

    /// Hold a consistent read view across several calls.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot { guard: self.read() }
    }

    // =========================================================================
    // DIAGNOSTICS
    // =========================================================================

    #[must_use]
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics::from_table(&self.read())
    }

    /// Index incoherences, empty when healthy.
    #[must_use]
    pub fn integrity_report(&self) -> Vec<String> {
        self.read().integrity_report()
    }
}

impl From<AtomTable> for AtomSpace {
    fn from(table: AtomTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A read view of the store held for the snapshot's lifetime.
///
/// Structure (atoms, types, indices) is frozen while the snapshot lives.
/// Truth values stay live: revisions by other threads remain visible.
#[derive(Debug)]
pub struct Snapshot<'a> {
    guard: RwLockReadGuard<'a, AtomTable>,
}

impl Snapshot<'_> {
    /// Compile and start a query against this snapshot.
    pub fn run(&self, query: &Query) -> Result<Matches<'_>, AtomSpaceError> {
        let plan = compile(&*self.guard, &query.pattern)?;
        Ok(Matches::new(
            StoreRef::Borrowed(&self.guard),
            plan,
            query.limits,
        ))
    }

    pub fn query(&self, pattern: &Pattern) -> Result<Matches<'_>, AtomSpaceError> {
        self.run(&Query::new(pattern.clone()))
    }

    #[must_use]
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics::from_table(&self.guard)
    }
}

impl Deref for Snapshot<'_> {
    type Target = AtomTable;

    fn deref(&self) -> &AtomTable {
        &self.guard
    }
}

// =============================================================================
// TESTS
// =============================================================================
