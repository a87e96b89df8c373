//! # atomspace-core
//!
//! The hypergraph engine for AtomSpace - THE LOGIC.
//!
//! This crate implements a typed hypergraph store and a pattern matcher:
//! - Atoms are nodes (type + name) or links (type + ordered outgoing set)
//! - Structurally equal atoms are stored once and share one handle
//! - Every atom may carry a `(strength, confidence)` truth value
//! - Patterns with variables are matched by a backtracking search
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Is synchronous and pure Rust: no async, no network, no disk
//! - Is deterministic: all indices are ordered, candidates are enumerated in
//!   handle (insertion) order
//! - Is closed: callers supply type hierarchies and constraints, never store
//!   behavior
//! - Never panics on bad input; the worst case is a refused mutation or an
//!   empty query result

// =============================================================================
// MODULES
// =============================================================================

pub mod index;
pub mod metrics;
pub mod pattern;
pub mod primitives;
pub mod query;
pub mod space;
pub mod store;
pub mod truth;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Atom, AtomKey, AtomSpaceError, AtomSpec, Handle, InsertOutcome, Payload, TypeEntry, TypeId,
    TypeRegistry,
};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use metrics::StoreMetrics;
pub use space::{AtomSpace, Snapshot};
pub use store::{AtomTable, HypergraphStore};
pub use truth::{TruthCell, TruthValue};

// =============================================================================
// RE-EXPORTS: Pattern Matching
// =============================================================================

pub use pattern::{
    Bindings, Constraint, GroundedAtom, Matches, Pattern, PatternTerm, Predicate, SearchPlan,
    Target, Variable, compile, match_all,
};
pub use query::{Query, QueryLimits};
