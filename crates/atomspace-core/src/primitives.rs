//! # Engine Primitives
//!
//! Hardcoded constants for the AtomSpace engine: built-in type names and the
//! bounds every insertion and query is checked against.

// =============================================================================
// BUILT-IN TYPES
// =============================================================================

/// Root of the type hierarchy.
pub const ATOM_TYPE_NAME: &str = "Atom";

/// Base type for named leaf atoms.
pub const NODE_TYPE_NAME: &str = "Node";

/// Base type for atoms with an outgoing set.
pub const LINK_TYPE_NAME: &str = "Link";

/// Pattern variables. Atoms of this type (or subtypes) are refused by the store.
pub const VARIABLE_TYPE_NAME: &str = "VariableNode";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for type names.
pub const MAX_TYPE_NAME_LENGTH: usize = 256;

/// Maximum length for node names (64KB).
pub const MAX_NAME_LENGTH: usize = 65536;

/// Maximum number of members in a link's outgoing set.
pub const MAX_ARITY: usize = 1024;

/// Maximum nesting depth of an `AtomSpec` or pattern term.
///
/// Bounds the recursion of insertion and unification.
pub const MAX_TERM_DEPTH: usize = 64;

/// Maximum number of clauses in one pattern.
pub const MAX_CLAUSES: usize = 128;
