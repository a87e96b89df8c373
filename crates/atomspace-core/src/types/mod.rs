//! # Core Type Definitions
//!
//! This module contains the identity and error types shared by every layer:
//! - Atom and type identifiers (`Handle`, `TypeId`)
//! - Structural atom description (`AtomKey`, `Payload`, `Atom`, `AtomSpec`)
//! - The open type hierarchy (`TypeRegistry`)
//! - Error types (`AtomSpaceError`)
//!
//! ## Determinism Guarantees
//!
//! Identifiers implement `Ord` so that every index can be kept in a
//! `BTreeMap`/`BTreeSet`. Handles are allocated monotonically, so ordering by
//! handle is ordering by insertion.

mod atom;
mod hierarchy;

pub use atom::{Atom, AtomKey, AtomSpec, InsertOutcome, Payload};
pub use hierarchy::{TypeEntry, TypeRegistry};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable identifier of an atom in the store.
///
/// Handles are assigned on insertion and never reused within a process.
/// They carry no arithmetic meaning beyond ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub u64);

impl Handle {
    /// Get the raw handle value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a registered atom type.
///
/// Type ids index the registry's parent-pointer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Root of the hierarchy.
    pub const ATOM: TypeId = TypeId(0);
    /// Base type of all nodes.
    pub const NODE: TypeId = TypeId(1);
    /// Base type of all links.
    pub const LINK: TypeId = TypeId(2);
    /// Pattern variables. Never stored as data.
    pub const VARIABLE: TypeId = TypeId(3);

    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the AtomSpace engine.
///
/// - No silent failures
/// - Use `Result<T, AtomSpaceError>` for fallible operations
/// - The engine never panics; a refused mutation or an empty query result
///   is the worst case
///
/// Inserting a structural duplicate is not an error: it returns the canonical
/// handle (see [`InsertOutcome::DuplicateSuppressed`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AtomSpaceError {
    /// The handle does not resolve to an atom.
    #[error("Atom not found: {0}")]
    NotFound(Handle),

    /// Removal refused because links still reference the atom.
    #[error("Atom {handle} is still referenced by {} link(s)", .referrers.len())]
    ReferentialIntegrityViolation {
        handle: Handle,
        referrers: Vec<Handle>,
    },

    /// A constraint references a variable that no clause introduces.
    #[error("Unbound variable in pattern: {0}")]
    UnboundVariable(String),

    /// An atom or pattern references a type that was never registered.
    #[error("Type not declared: {0}")]
    TypeUndeclared(String),

    /// A type was registered again under a different parent.
    #[error("Type {name} already declared with parent {existing}")]
    TypeConflict { name: String, existing: String },

    /// The atom description is structurally invalid.
    #[error("Invalid atom: {0}")]
    InvalidAtom(String),

    /// Strength or confidence outside `[0, 1]`, or not a number.
    #[error("Invalid truth value: strength {strength}, confidence {confidence}")]
    InvalidTruthValue { strength: f64, confidence: f64 },

    /// The query pattern is structurally invalid.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_order_by_allocation() {
        let mut handles = vec![Handle(3), Handle(1), Handle(2)];
        handles.sort();
        assert_eq!(handles, vec![Handle(1), Handle(2), Handle(3)]);
    }

    #[test]
    fn handle_display() {
        assert_eq!(Handle(17).to_string(), "#17");
    }

    #[test]
    fn referential_violation_message_counts_referrers() {
        let err = AtomSpaceError::ReferentialIntegrityViolation {
            handle: Handle(1),
            referrers: vec![Handle(4), Handle(9)],
        };
        assert_eq!(err.to_string(), "Atom #1 is still referenced by 2 link(s)");
    }
}
