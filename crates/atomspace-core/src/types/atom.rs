//! # Atom Model
//!
//! Pure value logic for nodes and links. An [`AtomKey`] is the structural
//! identity of an atom: two atoms are the same atom iff their keys are equal.
//! The store never holds two handles with equal keys.

use super::{Handle, TypeId};
use serde::{Deserialize, Serialize};
use std::hash::{DefaultHasher, Hash, Hasher};

// =============================================================================
// PAYLOAD
// =============================================================================

/// Structural payload of an atom.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Payload {
    /// Opaque name of a node.
    Node(String),
    /// Ordered outgoing set of a link.
    Link(Vec<Handle>),
}

// =============================================================================
// ATOM KEY
// =============================================================================

/// Structural identity of an atom: `(type, payload)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AtomKey {
    /// The exact type of the atom.
    pub type_id: TypeId,
    /// Node name or link outgoing set.
    pub payload: Payload,
}

impl AtomKey {
    /// Build the key of a node.
    #[must_use]
    pub fn node(type_id: TypeId, name: impl Into<String>) -> Self {
        Self {
            type_id,
            payload: Payload::Node(name.into()),
        }
    }

    /// Build the key of a link.
    #[must_use]
    pub fn link(type_id: TypeId, outgoing: Vec<Handle>) -> Self {
        Self {
            type_id,
            payload: Payload::Link(outgoing),
        }
    }

    #[must_use]
    pub fn is_node(&self) -> bool {
        matches!(self.payload, Payload::Node(_))
    }

    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self.payload, Payload::Link(_))
    }

    /// Node name, `None` for links.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.payload {
            Payload::Node(name) => Some(name),
            Payload::Link(_) => None,
        }
    }

    /// Outgoing set; empty for nodes.
    #[must_use]
    pub fn outgoing(&self) -> &[Handle] {
        match &self.payload {
            Payload::Node(_) => &[],
            Payload::Link(outgoing) => outgoing,
        }
    }

    /// Structural hash of `(type, payload)`.
    ///
    /// `DefaultHasher::new()` uses fixed keys, so equal keys hash equal
    /// across calls and across tables within a build.
    #[must_use]
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

// =============================================================================
// ATOM
// =============================================================================

/// A stored atom: its handle plus its structural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub handle: Handle,
    pub key: AtomKey,
}

impl Atom {
    #[must_use]
    pub const fn new(handle: Handle, key: AtomKey) -> Self {
        Self { handle, key }
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.key.type_id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.key.name()
    }

    #[must_use]
    pub fn outgoing(&self) -> &[Handle] {
        self.key.outgoing()
    }

    #[must_use]
    pub fn is_link(&self) -> bool {
        self.key.is_link()
    }
}

// =============================================================================
// ATOM SPEC (insertion description)
// =============================================================================

/// Caller-side description of an atom to insert.
///
/// Types are referenced by name and resolved against the registry at
/// insertion time. Link members may be nested specs or existing handles; the
/// whole tree is inserted under one write lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomSpec {
    Node { atom_type: String, name: String },
    Link {
        atom_type: String,
        outgoing: Vec<AtomSpec>,
    },
    Existing(Handle),
}

impl AtomSpec {
    #[must_use]
    pub fn node(atom_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Node {
            atom_type: atom_type.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn link(atom_type: impl Into<String>, outgoing: Vec<AtomSpec>) -> Self {
        Self::Link {
            atom_type: atom_type.into(),
            outgoing,
        }
    }

    #[must_use]
    pub const fn existing(handle: Handle) -> Self {
        Self::Existing(handle)
    }
}

impl From<Handle> for AtomSpec {
    fn from(handle: Handle) -> Self {
        Self::Existing(handle)
    }
}

// =============================================================================
// INSERT OUTCOME
// =============================================================================

/// Result of an insertion.
///
/// `DuplicateSuppressed` is not an error: the structural duplicate was found
/// and its canonical handle is returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(Handle),
    DuplicateSuppressed(Handle),
}

impl InsertOutcome {
    #[must_use]
    pub const fn handle(self) -> Handle {
        match self {
            Self::Created(h) | Self::DuplicateSuppressed(h) => h,
        }
    }

    #[must_use]
    pub const fn is_created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
