//! # Hypergraph Store
//!
//! The atom table and the single-writer mutation logic.
//!
//! [`AtomTable`] owns every atom record and the three indices. All structural
//! mutations take `&mut self`; the concurrent [`AtomSpace`](crate::AtomSpace)
//! wraps the table in a `RwLock` so one mutation at a time updates the table
//! and all indices together. Truth values live in per-atom cells and are
//! updated through `&self`.

use crate::index::{ContentIndex, IncomingIndex, TypeIndex};
use crate::primitives::{MAX_ARITY, MAX_NAME_LENGTH, MAX_TERM_DEPTH};
use crate::truth::{TruthCell, TruthValue};
use crate::types::{
    Atom, AtomKey, AtomSpaceError, AtomSpec, Handle, InsertOutcome, Payload, TypeId, TypeRegistry,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// HYPERGRAPHSTORE TRAIT
// =============================================================================

/// Read-only view of a hypergraph, as consumed by the pattern matcher.
///
/// All handle sequences are returned in ascending handle order, which is
/// insertion order.
pub trait HypergraphStore {
    /// The type hierarchy atoms are checked against.
    fn types(&self) -> &TypeRegistry;

    /// Structural key of an atom, `None` if the handle is unknown.
    fn key(&self, handle: Handle) -> Option<&AtomKey>;

    /// Links referencing `handle`. `None` if the handle is unknown.
    fn incoming(&self, handle: Handle) -> Option<&BTreeSet<Handle>>;

    /// Atoms of type `ty`, optionally including all subtypes.
    fn handles_of_type(&self, ty: TypeId, include_subtypes: bool) -> Vec<Handle>;

    /// Number of atoms of exactly type `ty`.
    fn count_of_type(&self, ty: TypeId) -> usize;

    /// Handle of the atom with this key, if stored.
    fn lookup(&self, key: &AtomKey) -> Option<Handle>;

    /// Current truth value of an atom.
    fn truth_value(&self, handle: Handle) -> Option<TruthValue>;

    /// Every stored handle.
    fn handles(&self) -> Vec<Handle>;

    /// Number of stored atoms.
    fn atom_count(&self) -> usize;

    /// Check if a handle is stored.
    fn contains(&self, handle: Handle) -> bool {
        self.key(handle).is_some()
    }
}

// =============================================================================
// ATOM TABLE
// =============================================================================

/// One stored atom.
#[derive(Debug)]
struct AtomRecord {
    key: AtomKey,
    hash: u64,
    truth: TruthCell,
}

/// Arena of atom records plus their indices.
///
/// Handles are allocated from a monotonic counter and never reused, so a
/// link's handle is always greater than the handles of its members.
#[derive(Debug, Default)]
pub struct AtomTable {
    types: TypeRegistry,
    atoms: BTreeMap<Handle, AtomRecord>,
    by_type: TypeIndex,
    content: ContentIndex,
    incoming: IncomingIndex,
    next_handle: u64,
}

/// An `AtomSpec` whose types and handles have been checked.
enum Resolved {
    Node(AtomKey),
    Link {
        type_id: TypeId,
        outgoing: Vec<Resolved>,
    },
    Existing(Handle),
}

impl AtomTable {
    /// Create an empty table with the built-in types registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next handle that would be assigned.
    #[must_use]
    pub fn next_handle(&self) -> u64 {
        self.next_handle
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// All atoms in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &AtomKey)> {
        self.atoms.iter().map(|(h, r)| (*h, &r.key))
    }

    // =========================================================================
    // TYPES
    // =========================================================================

    /// Register a type under `parent` (defaults to `Atom`).
    pub fn register_type(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<TypeId, AtomSpaceError> {
        let before = self.types.len();
        let id = self.types.register(name, parent)?;
        if self.types.len() > before {
            tracing::debug!(type_name = name, parent = ?parent, type_id = id.0, "type registered");
        }
        Ok(id)
    }

    /// Look up a type id by name, failing with `TypeUndeclared`.
    pub fn resolve_type(&self, name: &str) -> Result<TypeId, AtomSpaceError> {
        self.types.resolve(name)
    }

    /// Name of a registered type.
    #[must_use]
    pub fn type_name(&self, id: TypeId) -> Option<&str> {
        self.types.name(id)
    }

    // =========================================================================
    // INSERTION
    // =========================================================================

    /// Insert an atom description, returning its canonical handle.
    ///
    /// The whole description is validated before anything is stored, so a
    /// failing nested member leaves the table untouched. A supplied truth
    /// value is revised into the top-level atom whether it was created or
    /// already present.
    pub fn insert(
        &mut self,
        spec: &AtomSpec,
        truth: Option<TruthValue>,
    ) -> Result<InsertOutcome, AtomSpaceError> {
        let resolved = self.resolve_spec(spec, 0)?;
        let outcome = self.insert_resolved(resolved);
        if let Some(tv) = truth {
            self.revise_truth(outcome.handle(), tv)?;
        }
        Ok(outcome)
    }

    /// Insert a node by type name.
    pub fn add_node(&mut self, atom_type: &str, name: &str) -> Result<Handle, AtomSpaceError> {
        Ok(self.insert(&AtomSpec::node(atom_type, name), None)?.handle())
    }

    /// Insert a link over existing handles.
    pub fn add_link(
        &mut self,
        atom_type: &str,
        outgoing: &[Handle],
    ) -> Result<Handle, AtomSpaceError> {
        let type_id = self.types.resolve(atom_type)?;
        let key = AtomKey::link(type_id, outgoing.to_vec());
        Ok(self.insert_key(key)?.handle())
    }

    /// Insert a pre-built key after validating it.
    pub fn insert_key(&mut self, key: AtomKey) -> Result<InsertOutcome, AtomSpaceError> {
        self.validate_key(&key)?;
        Ok(self.intern(key))
    }

    fn validate_key(&self, key: &AtomKey) -> Result<(), AtomSpaceError> {
        if !self.types.contains(key.type_id) {
            return Err(AtomSpaceError::TypeUndeclared(format!(
                "type id {}",
                key.type_id.0
            )));
        }
        match &key.payload {
            Payload::Node(name) => {
                self.check_node_type(key.type_id)?;
                Self::check_name(name)?;
            }
            Payload::Link(outgoing) => {
                self.check_link_type(key.type_id)?;
                Self::check_arity(outgoing.len())?;
                for member in outgoing {
                    if !self.atoms.contains_key(member) {
                        return Err(AtomSpaceError::NotFound(*member));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_node_type(&self, type_id: TypeId) -> Result<(), AtomSpaceError> {
        if self.types.is_a(type_id, TypeId::VARIABLE) {
            return Err(AtomSpaceError::InvalidAtom(
                "variable atoms exist only inside patterns".to_string(),
            ));
        }
        if !self.types.admits_node(type_id) {
            return Err(AtomSpaceError::InvalidAtom(format!(
                "type {} is a link type",
                self.types.name(type_id).unwrap_or("?")
            )));
        }
        Ok(())
    }

    fn check_link_type(&self, type_id: TypeId) -> Result<(), AtomSpaceError> {
        if !self.types.admits_link(type_id) {
            return Err(AtomSpaceError::InvalidAtom(format!(
                "type {} is a node type",
                self.types.name(type_id).unwrap_or("?")
            )));
        }
        Ok(())
    }

    fn check_name(name: &str) -> Result<(), AtomSpaceError> {
        if name.len() > MAX_NAME_LENGTH {
            return Err(AtomSpaceError::InvalidAtom(format!(
                "node name length {} exceeds maximum {} bytes",
                name.len(),
                MAX_NAME_LENGTH
            )));
        }
        Ok(())
    }

    fn check_arity(arity: usize) -> Result<(), AtomSpaceError> {
        if arity > MAX_ARITY {
            return Err(AtomSpaceError::InvalidAtom(format!(
                "link arity {} exceeds maximum {}",
                arity, MAX_ARITY
            )));
        }
        Ok(())
    }

    fn resolve_spec(&self, spec: &AtomSpec, depth: usize) -> Result<Resolved, AtomSpaceError> {
        if depth > MAX_TERM_DEPTH {
            return Err(AtomSpaceError::InvalidAtom(format!(
                "atom description nested deeper than {}",
                MAX_TERM_DEPTH
            )));
        }
        match spec {
            AtomSpec::Node { atom_type, name } => {
                let type_id = self.types.resolve(atom_type)?;
                self.check_node_type(type_id)?;
                Self::check_name(name)?;
                Ok(Resolved::Node(AtomKey::node(type_id, name.clone())))
            }
            AtomSpec::Link {
                atom_type,
                outgoing,
            } => {
                let type_id = self.types.resolve(atom_type)?;
                self.check_link_type(type_id)?;
                Self::check_arity(outgoing.len())?;
                let members = outgoing
                    .iter()
                    .map(|member| self.resolve_spec(member, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Resolved::Link {
                    type_id,
                    outgoing: members,
                })
            }
            AtomSpec::Existing(handle) => {
                if self.atoms.contains_key(handle) {
                    Ok(Resolved::Existing(*handle))
                } else {
                    Err(AtomSpaceError::NotFound(*handle))
                }
            }
        }
    }

    fn insert_resolved(&mut self, resolved: Resolved) -> InsertOutcome {
        match resolved {
            Resolved::Node(key) => self.intern(key),
            Resolved::Link { type_id, outgoing } => {
                let members = outgoing
                    .into_iter()
                    .map(|member| self.insert_resolved(member).handle())
                    .collect();
                self.intern(AtomKey::link(type_id, members))
            }
            Resolved::Existing(handle) => InsertOutcome::DuplicateSuppressed(handle),
        }
    }

    /// Return the canonical handle for `key`, storing it if new.
    fn intern(&mut self, key: AtomKey) -> InsertOutcome {
        let hash = key.structural_hash();
        if let Some(existing) = self.find_by_hash(&key, hash) {
            tracing::trace!(handle = %existing, "duplicate suppressed");
            return InsertOutcome::DuplicateSuppressed(existing);
        }

        let handle = Handle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);

        self.by_type.insert(key.type_id, handle);
        self.content.insert(hash, handle);
        self.incoming.register(handle);
        if let Payload::Link(outgoing) = &key.payload {
            self.incoming.add_link(handle, outgoing);
        }

        tracing::debug!(
            handle = %handle,
            type_name = self.types.name(key.type_id).unwrap_or("?"),
            arity = key.outgoing().len(),
            "atom created"
        );

        self.atoms.insert(
            handle,
            AtomRecord {
                key,
                hash,
                truth: TruthCell::default(),
            },
        );
        InsertOutcome::Created(handle)
    }

    fn find_by_hash(&self, key: &AtomKey, hash: u64) -> Option<Handle> {
        self.content
            .candidates(hash)
            .iter()
            .copied()
            .find(|h| self.atoms.get(h).is_some_and(|r| r.key == *key))
    }

    // =========================================================================
    // REMOVAL
    // =========================================================================

    /// Remove an atom that nothing references.
    ///
    /// Refused with `ReferentialIntegrityViolation` while the incoming set is
    /// non-empty.
    pub fn remove(&mut self, handle: Handle) -> Result<Atom, AtomSpaceError> {
        let referrers: Vec<Handle> = match self.incoming.incoming(handle) {
            Some(set) => set.iter().copied().collect(),
            None => return Err(AtomSpaceError::NotFound(handle)),
        };
        if !referrers.is_empty() {
            return Err(AtomSpaceError::ReferentialIntegrityViolation { handle, referrers });
        }

        let record = self
            .atoms
            .remove(&handle)
            .ok_or(AtomSpaceError::NotFound(handle))?;

        self.by_type.remove(record.key.type_id, handle);
        self.content.remove(record.hash, handle);
        if let Payload::Link(outgoing) = &record.key.payload {
            self.incoming.remove_link(handle, outgoing);
        }
        self.incoming.unregister(handle);

        tracing::debug!(handle = %handle, "atom removed");
        Ok(Atom::new(handle, record.key))
    }

    /// Remove an atom together with its whole incoming closure.
    ///
    /// Returns the removed handles, dependents first.
    pub fn remove_cascade(&mut self, handle: Handle) -> Result<Vec<Handle>, AtomSpaceError> {
        if !self.atoms.contains_key(&handle) {
            return Err(AtomSpaceError::NotFound(handle));
        }

        let mut closure = BTreeSet::from([handle]);
        let mut queue = VecDeque::from([handle]);
        while let Some(current) = queue.pop_front() {
            if let Some(referrers) = self.incoming.incoming(current) {
                for link in referrers {
                    if closure.insert(*link) {
                        queue.push_back(*link);
                    }
                }
            }
        }

        // A link always has a larger handle than its members, so descending
        // order removes every referrer before its targets.
        let mut removed = Vec::with_capacity(closure.len());
        for h in closure.into_iter().rev() {
            self.remove(h)?;
            removed.push(h);
        }

        tracing::debug!(handle = %handle, removed = removed.len(), "cascade removal");
        Ok(removed)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Get an atom by handle.
    pub fn get(&self, handle: Handle) -> Result<Atom, AtomSpaceError> {
        self.atoms
            .get(&handle)
            .map(|r| Atom::new(handle, r.key.clone()))
            .ok_or(AtomSpaceError::NotFound(handle))
    }

    /// Links that reference `handle`, in handle order.
    pub fn get_incoming(&self, handle: Handle) -> Result<Vec<Handle>, AtomSpaceError> {
        self.incoming
            .incoming(handle)
            .map(|set| set.iter().copied().collect())
            .ok_or(AtomSpaceError::NotFound(handle))
    }

    /// Atoms of a named type, optionally including subtypes.
    pub fn get_by_type(
        &self,
        atom_type: &str,
        include_subtypes: bool,
    ) -> Result<Vec<Handle>, AtomSpaceError> {
        let type_id = self.types.resolve(atom_type)?;
        Ok(self.handles_of_type(type_id, include_subtypes))
    }

    /// Find a node without inserting it.
    pub fn find_node(&self, atom_type: &str, name: &str) -> Result<Option<Handle>, AtomSpaceError> {
        let type_id = self.types.resolve(atom_type)?;
        Ok(self.lookup(&AtomKey::node(type_id, name)))
    }

    /// Find a link without inserting it.
    pub fn find_link(
        &self,
        atom_type: &str,
        outgoing: &[Handle],
    ) -> Result<Option<Handle>, AtomSpaceError> {
        let type_id = self.types.resolve(atom_type)?;
        Ok(self.lookup(&AtomKey::link(type_id, outgoing.to_vec())))
    }

    // =========================================================================
    // TRUTH VALUES
    // =========================================================================

    fn truth_cell(&self, handle: Handle) -> Result<&TruthCell, AtomSpaceError> {
        self.atoms
            .get(&handle)
            .map(|r| &r.truth)
            .ok_or(AtomSpaceError::NotFound(handle))
    }

    /// Revise an atom's truth value with a new observation.
    ///
    /// Takes `&self`: only the atom's own cell is locked.
    pub fn revise_truth(
        &self,
        handle: Handle,
        observation: TruthValue,
    ) -> Result<TruthValue, AtomSpaceError> {
        Ok(self.truth_cell(handle)?.revise(observation))
    }

    /// Overwrite (or clear) an atom's truth value. Returns the previous value.
    pub fn replace_truth(
        &self,
        handle: Handle,
        value: Option<TruthValue>,
    ) -> Result<Option<TruthValue>, AtomSpaceError> {
        Ok(self.truth_cell(handle)?.replace(value))
    }

    /// An atom's truth value; `Ok(None)` means unknown.
    pub fn get_truth(&self, handle: Handle) -> Result<Option<TruthValue>, AtomSpaceError> {
        Ok(self.truth_cell(handle)?.get())
    }

    // =========================================================================
    // INTEGRITY
    // =========================================================================

    /// Cross-check the atom table against every index.
    ///
    /// Returns a description of each incoherence found; empty when healthy.
    #[must_use]
    pub fn integrity_report(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (handle, record) in &self.atoms {
            if !self.by_type.contains(record.key.type_id, *handle) {
                problems.push(format!("{} missing from type index", handle));
            }
            if record.key.structural_hash() != record.hash {
                problems.push(format!("{} has a stale content hash", handle));
            }
            if !self.content.candidates(record.hash).contains(handle) {
                problems.push(format!("{} missing from content index", handle));
            }
            if self.incoming.incoming(*handle).is_none() {
                problems.push(format!("{} missing from incoming index", handle));
            }
            for member in record.key.outgoing() {
                match self.incoming.incoming(*member) {
                    Some(set) if set.contains(handle) => {}
                    Some(_) => problems.push(format!(
                        "{} not in incoming set of member {}",
                        handle, member
                    )),
                    None => problems.push(format!("{} references unknown {}", handle, member)),
                }
            }
        }

        for (ty, bucket) in self.by_type.iter() {
            for handle in bucket {
                match self.atoms.get(handle) {
                    Some(r) if r.key.type_id == ty => {}
                    _ => problems.push(format!("type index holds stale {}", handle)),
                }
            }
        }

        if self.content.len() != self.atoms.len() {
            problems.push(format!(
                "content index has {} entries for {} atoms",
                self.content.len(),
                self.atoms.len()
            ));
        }

        for (handle, referrers) in self.incoming.iter() {
            if !self.atoms.contains_key(&handle) {
                problems.push(format!("incoming index tracks unknown {}", handle));
            }
            for link in referrers {
                let ok = self
                    .atoms
                    .get(link)
                    .is_some_and(|r| r.key.outgoing().contains(&handle));
                if !ok {
                    problems.push(format!("{} wrongly listed as referencing {}", link, handle));
                }
            }
        }

        problems
    }
}

impl HypergraphStore for AtomTable {
    fn types(&self) -> &TypeRegistry {
        &self.types
    }

    fn key(&self, handle: Handle) -> Option<&AtomKey> {
        self.atoms.get(&handle).map(|r| &r.key)
    }

    fn incoming(&self, handle: Handle) -> Option<&BTreeSet<Handle>> {
        self.incoming.incoming(handle)
    }

    fn handles_of_type(&self, ty: TypeId, include_subtypes: bool) -> Vec<Handle> {
        if include_subtypes {
            self.by_type.union(&self.types.subtypes(ty))
        } else {
            self.by_type
                .exact(ty)
                .map(|bucket| bucket.iter().copied().collect())
                .unwrap_or_default()
        }
    }

    fn count_of_type(&self, ty: TypeId) -> usize {
        self.by_type.count(ty)
    }

    fn lookup(&self, key: &AtomKey) -> Option<Handle> {
        self.find_by_hash(key, key.structural_hash())
    }

    fn truth_value(&self, handle: Handle) -> Option<TruthValue> {
        self.atoms.get(&handle).and_then(|r| r.truth.get())
    }

    fn handles(&self) -> Vec<Handle> {
        self.atoms.keys().copied().collect()
    }

    fn atom_count(&self) -> usize {
        self.atoms.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AtomTable {
        let mut table = AtomTable::new();
        table.register_type("Concept", Some("Node")).expect("concept");
        table
            .register_type("Categorization", Some("Link"))
            .expect("categorization");
        table
    }

    fn tv(s: f64, c: f64) -> TruthValue {
        TruthValue::new(s, c).expect("tv")
    }

    #[test]
    fn insert_and_get_node() {
        let mut table = table();
        let h = table.add_node("Concept", "Walmart").expect("insert");
        let atom = table.get(h).expect("get");
        assert_eq!(atom.name(), Some("Walmart"));
        assert_eq!(table.type_name(atom.type_id()), Some("Concept"));
    }

    #[test]
    fn duplicate_insert_returns_same_handle() {
        let mut table = table();
        let first = table
            .insert(&AtomSpec::node("Concept", "Walmart"), None)
            .expect("first");
        let second = table
            .insert(&AtomSpec::node("Concept", "Walmart"), None)
            .expect("second");
        assert!(first.is_created());
        assert_eq!(second, InsertOutcome::DuplicateSuppressed(first.handle()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn duplicate_insert_revises_truth() {
        let mut table = table();
        let spec = AtomSpec::node("Concept", "Walmart");
        let h = table.insert(&spec, Some(tv(1.0, 0.5))).expect("first").handle();
        table.insert(&spec, Some(tv(0.0, 0.5))).expect("second");
        let merged = table.get_truth(h).expect("truth").expect("known");
        assert!((merged.strength() - 0.5).abs() < 1e-12);
        assert!((merged.confidence() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn nested_spec_inserts_members() {
        let mut table = table();
        let spec = AtomSpec::link(
            "Categorization",
            vec![
                AtomSpec::node("Concept", "Walmart"),
                AtomSpec::node("Concept", "Groceries"),
            ],
        );
        let link = table.insert(&spec, None).expect("insert").handle();
        assert_eq!(table.len(), 3);
        let walmart = table.find_node("Concept", "Walmart").expect("find");
        assert_eq!(table.get_incoming(walmart.expect("walmart")).expect("in"), vec![link]);
    }

    #[test]
    fn failing_nested_spec_leaves_table_untouched() {
        let mut table = table();
        let spec = AtomSpec::link(
            "Categorization",
            vec![
                AtomSpec::node("Concept", "Walmart"),
                AtomSpec::node("Payee", "Groceries"),
            ],
        );
        let err = table.insert(&spec, None);
        assert_eq!(err, Err(AtomSpaceError::TypeUndeclared("Payee".into())));
        assert!(table.is_empty());
    }

    #[test]
    fn undeclared_type_rejected() {
        let mut table = table();
        assert!(matches!(
            table.add_node("Payee", "x"),
            Err(AtomSpaceError::TypeUndeclared(_))
        ));
    }

    #[test]
    fn variables_cannot_be_stored() {
        let mut table = table();
        assert!(matches!(
            table.add_node("VariableNode", "$X"),
            Err(AtomSpaceError::InvalidAtom(_))
        ));
    }

    #[test]
    fn kind_mismatch_rejected() {
        let mut table = table();
        assert!(table.add_node("Categorization", "x").is_err());
        let a = table.add_node("Concept", "a").expect("a");
        assert!(table.add_link("Concept", &[a]).is_err());
    }

    #[test]
    fn link_to_unknown_handle_rejected() {
        let mut table = table();
        let err = table.add_link("Categorization", &[Handle(99)]);
        assert_eq!(err, Err(AtomSpaceError::NotFound(Handle(99))));
    }

    #[test]
    fn remove_refused_while_referenced() {
        let mut table = table();
        let a = table.add_node("Concept", "a").expect("a");
        let b = table.add_node("Concept", "b").expect("b");
        let l = table.add_link("Categorization", &[a, b]).expect("l");

        let err = table.remove(a);
        assert_eq!(
            err,
            Err(AtomSpaceError::ReferentialIntegrityViolation {
                handle: a,
                referrers: vec![l],
            })
        );

        table.remove(l).expect("remove link");
        table.remove(a).expect("remove node");
        assert!(table.get(a).is_err());
        assert!(table.integrity_report().is_empty());
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let mut table = table();
        assert_eq!(table.remove(Handle(7)), Err(AtomSpaceError::NotFound(Handle(7))));
    }

    #[test]
    fn cascade_removes_dependents_first() {
        let mut table = table();
        let a = table.add_node("Concept", "a").expect("a");
        let b = table.add_node("Concept", "b").expect("b");
        let l1 = table.add_link("Categorization", &[a, b]).expect("l1");
        let l2 = table.add_link("Link", &[l1, b]).expect("l2");

        let removed = table.remove_cascade(a).expect("cascade");
        assert_eq!(removed, vec![l2, l1, a]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get_incoming(b).expect("b"), Vec::<Handle>::new());
        assert!(table.integrity_report().is_empty());
    }

    #[test]
    fn handles_are_not_reused() {
        let mut table = table();
        let a = table.add_node("Concept", "a").expect("a");
        table.remove(a).expect("remove");
        let again = table.add_node("Concept", "a").expect("again");
        assert_ne!(a, again);
    }

    #[test]
    fn get_by_type_with_subtypes() {
        let mut table = table();
        table.register_type("Merchant", Some("Concept")).expect("merchant");
        let c = table.add_node("Concept", "Groceries").expect("c");
        let m = table.add_node("Merchant", "Walmart").expect("m");

        assert_eq!(table.get_by_type("Concept", false).expect("exact"), vec![c]);
        assert_eq!(table.get_by_type("Concept", true).expect("sub"), vec![c, m]);
        assert_eq!(table.get_by_type("Node", true).expect("node"), vec![c, m]);
    }

    #[test]
    fn truth_unknown_until_set() {
        let mut table = table();
        let h = table.add_node("Concept", "a").expect("a");
        assert_eq!(table.get_truth(h).expect("get"), None);
        table.revise_truth(h, tv(0.9, 0.2)).expect("set");
        assert_eq!(table.get_truth(h).expect("get"), Some(tv(0.9, 0.2)));
        table.replace_truth(h, None).expect("clear");
        assert_eq!(table.get_truth(h).expect("get"), None);
    }

    #[test]
    fn truth_on_unknown_handle_not_found() {
        let table = table();
        assert!(table.revise_truth(Handle(3), tv(0.5, 0.5)).is_err());
        assert!(table.get_truth(Handle(3)).is_err());
    }

    #[test]
    fn lookup_without_insert() {
        let mut table = table();
        let a = table.add_node("Concept", "a").expect("a");
        assert_eq!(table.find_node("Concept", "a").expect("find"), Some(a));
        assert_eq!(table.find_node("Concept", "zzz").expect("find"), None);
        assert_eq!(table.find_link("Categorization", &[a]).expect("find"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn integrity_report_clean_after_mutations() {
        let mut table = table();
        let a = table.add_node("Concept", "a").expect("a");
        let b = table.add_node("Concept", "b").expect("b");
        let l = table.add_link("Categorization", &[a, a, b]).expect("l");
        assert!(table.integrity_report().is_empty());
        table.remove(l).expect("remove");
        assert!(table.integrity_report().is_empty());
    }
}
