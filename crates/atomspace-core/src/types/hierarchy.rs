//! # Type Hierarchy
//!
//! Open, runtime-extensible atom type registry.
//!
//! Types form a tree rooted at `Atom`. Each entry stores a parent pointer;
//! is-a checks walk the parent chain iteratively and subtype enumeration walks
//! the child table breadth-first. Types are never removed, so a `TypeId` stays
//! valid for the lifetime of the registry.

use super::{AtomSpaceError, TypeId};
use crate::primitives::{
    ATOM_TYPE_NAME, LINK_TYPE_NAME, MAX_TYPE_NAME_LENGTH, NODE_TYPE_NAME, VARIABLE_TYPE_NAME,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// A registered type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    pub id: TypeId,
    pub name: String,
    /// `None` only for the root type.
    pub parent: Option<TypeId>,
}

/// Registry of atom types with explicit parent pointers.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
    children: Vec<Vec<TypeId>>,
    by_name: BTreeMap<String, TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding the built-in types:
    /// `Atom`, `Node` and `Link` under `Atom`, `VariableNode` under `Node`.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            children: Vec::new(),
            by_name: BTreeMap::new(),
        };
        registry.push(ATOM_TYPE_NAME, None);
        registry.push(NODE_TYPE_NAME, Some(TypeId::ATOM));
        registry.push(LINK_TYPE_NAME, Some(TypeId::ATOM));
        registry.push(VARIABLE_TYPE_NAME, Some(TypeId::NODE));
        registry
    }

    fn push(&mut self, name: &str, parent: Option<TypeId>) -> TypeId {
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(TypeEntry {
            id,
            name: name.to_string(),
            parent,
        });
        self.children.push(Vec::new());
        if let Some(siblings) = parent.and_then(|p| self.children.get_mut(p.index())) {
            siblings.push(id);
        }
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Register a type under `parent` (defaults to `Atom`).
    ///
    /// Re-registering a type with the same parent is a no-op returning the
    /// existing id; a different parent is a `TypeConflict`.
    pub fn register(&mut self, name: &str, parent: Option<&str>) -> Result<TypeId, AtomSpaceError> {
        if name.is_empty() || name.len() > MAX_TYPE_NAME_LENGTH {
            return Err(AtomSpaceError::InvalidAtom(format!(
                "type name must be 1..={} bytes",
                MAX_TYPE_NAME_LENGTH
            )));
        }

        let parent_id = match parent {
            Some(p) => self.resolve(p)?,
            None => TypeId::ATOM,
        };

        if let Some(&existing) = self.by_name.get(name) {
            let existing_parent = self.parent(existing);
            if existing_parent == Some(parent_id) {
                return Ok(existing);
            }
            let existing_name = existing_parent
                .and_then(|p| self.name(p))
                .unwrap_or("<root>")
                .to_string();
            return Err(AtomSpaceError::TypeConflict {
                name: name.to_string(),
                existing: existing_name,
            });
        }

        Ok(self.push(name, Some(parent_id)))
    }

    /// Look up a type id by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Look up a type id by name, failing with `TypeUndeclared`.
    pub fn resolve(&self, name: &str) -> Result<TypeId, AtomSpaceError> {
        self.get(name)
            .ok_or_else(|| AtomSpaceError::TypeUndeclared(name.to_string()))
    }

    #[must_use]
    pub fn name(&self, id: TypeId) -> Option<&str> {
        self.entries.get(id.index()).map(|e| e.name.as_str())
    }

    #[must_use]
    pub fn parent(&self, id: TypeId) -> Option<TypeId> {
        self.entries.get(id.index()).and_then(|e| e.parent)
    }

    #[must_use]
    pub fn contains(&self, id: TypeId) -> bool {
        id.index() < self.entries.len()
    }

    /// True if `ty` equals `ancestor` or descends from it.
    #[must_use]
    pub fn is_a(&self, ty: TypeId, ancestor: TypeId) -> bool {
        let mut current = Some(ty);
        while let Some(t) = current {
            if t == ancestor {
                return true;
            }
            current = self.parent(t);
        }
        false
    }

    /// `ty` and all of its transitive subtypes, in registration order.
    #[must_use]
    pub fn subtypes(&self, ty: TypeId) -> Vec<TypeId> {
        if !self.contains(ty) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut queue = VecDeque::from([ty]);
        while let Some(t) = queue.pop_front() {
            out.push(t);
            if let Some(kids) = self.children.get(t.index()) {
                queue.extend(kids.iter().copied());
            }
        }
        out.sort();
        out
    }

    /// Can an atom of this type be stored as a node?
    #[must_use]
    pub fn admits_node(&self, ty: TypeId) -> bool {
        !self.is_a(ty, TypeId::LINK) && !self.is_a(ty, TypeId::VARIABLE)
    }

    /// Can an atom of this type be stored as a link?
    #[must_use]
    pub fn admits_link(&self, ty: TypeId) -> bool {
        !self.is_a(ty, TypeId::NODE)
    }

    /// Number of registered types, built-ins included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.iter()
    }

    /// Direct children of a type.
    #[must_use]
    pub fn children(&self, id: TypeId) -> &[TypeId] {
        self.children.get(id.index()).map_or(&[], Vec::as_slice)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register("Concept", Some("Node")).expect("concept");
        types.register("Merchant", Some("Concept")).expect("merchant");
        types.register("Categorization", Some("Link")).expect("link");
        types
    }

    #[test]
    fn builtins_present() {
        let types = TypeRegistry::new();
        assert_eq!(types.get("Atom"), Some(TypeId::ATOM));
        assert_eq!(types.get("Node"), Some(TypeId::NODE));
        assert_eq!(types.get("Link"), Some(TypeId::LINK));
        assert_eq!(types.get("VariableNode"), Some(TypeId::VARIABLE));
        assert_eq!(types.len(), 4);
    }

    #[test]
    fn is_a_walks_parents() {
        let types = registry();
        let merchant = types.resolve("Merchant").expect("merchant");
        let concept = types.resolve("Concept").expect("concept");
        assert!(types.is_a(merchant, concept));
        assert!(types.is_a(merchant, TypeId::NODE));
        assert!(types.is_a(merchant, TypeId::ATOM));
        assert!(!types.is_a(concept, merchant));
        assert!(!types.is_a(merchant, TypeId::LINK));
    }

    #[test]
    fn subtypes_include_self_and_descendants() {
        let types = registry();
        let concept = types.resolve("Concept").expect("concept");
        let merchant = types.resolve("Merchant").expect("merchant");
        assert_eq!(types.subtypes(concept), vec![concept, merchant]);
        assert_eq!(types.subtypes(merchant), vec![merchant]);
    }

    #[test]
    fn reregister_same_parent_is_noop() {
        let mut types = registry();
        let first = types.resolve("Concept").expect("concept");
        let again = types.register("Concept", Some("Node")).expect("again");
        assert_eq!(first, again);
    }

    #[test]
    fn reregister_other_parent_conflicts() {
        let mut types = registry();
        let err = types.register("Concept", Some("Link"));
        assert!(matches!(err, Err(AtomSpaceError::TypeConflict { .. })));
    }

    #[test]
    fn unknown_parent_undeclared() {
        let mut types = TypeRegistry::new();
        let err = types.register("Payee", Some("Entity"));
        assert_eq!(err, Err(AtomSpaceError::TypeUndeclared("Entity".into())));
    }

    #[test]
    fn parentless_type_goes_under_atom() {
        let mut types = TypeRegistry::new();
        let id = types.register("Thing", None).expect("thing");
        assert_eq!(types.parent(id), Some(TypeId::ATOM));
        assert!(types.admits_node(id));
        assert!(types.admits_link(id));
    }

    #[test]
    fn kind_admission() {
        let types = registry();
        let concept = types.resolve("Concept").expect("concept");
        let cat = types.resolve("Categorization").expect("cat");
        assert!(types.admits_node(concept));
        assert!(!types.admits_link(concept));
        assert!(types.admits_link(cat));
        assert!(!types.admits_node(cat));
        assert!(!types.admits_node(TypeId::VARIABLE));
    }

    #[test]
    fn empty_name_rejected() {
        let mut types = TypeRegistry::new();
        assert!(types.register("", None).is_err());
    }
}
