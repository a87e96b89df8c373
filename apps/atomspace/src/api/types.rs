//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. The CLI script
//! runner reads and prints the same structures.

use atomspace_core::{
    Atom, AtomSpaceError, AtomSpec, Bindings, Constraint, Handle, Pattern, PatternTerm, Query,
    QueryLimits, StoreMetrics, Target, TruthValue, TypeEntry,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Store status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub atom_count: usize,
    pub node_count: usize,
    pub link_count: usize,
    pub type_count: usize,
    pub annotated_count: usize,
    pub max_arity: usize,
    pub link_density_millionths: u64,
    pub per_type: BTreeMap<String, usize>,
}

impl From<StoreMetrics> for StatusResponse {
    fn from(m: StoreMetrics) -> Self {
        Self {
            atom_count: m.atom_count,
            node_count: m.node_count,
            link_count: m.link_count,
            type_count: m.type_count,
            annotated_count: m.annotated_count,
            max_arity: m.max_arity,
            link_density_millionths: m.link_density_millionths,
            per_type: m.per_type,
        }
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// A type declaration: name plus optional parent (defaults to `Atom`).
///
/// Used by `POST /types`, `GET /types`, config `[[types]]` tables and scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeJson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl TypeJson {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
        }
    }

    /// Describe a registry entry, resolving the parent's name.
    #[must_use]
    pub fn from_entry(entry: &TypeEntry, all: &[TypeEntry]) -> Self {
        let parent = entry
            .parent
            .and_then(|p| all.iter().find(|e| e.id == p))
            .map(|e| e.name.clone());
        Self {
            name: entry.name.clone(),
            parent,
        }
    }
}

/// Type registration response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegisteredResponse {
    pub name: String,
    pub type_id: u32,
}

/// Listing of registered types, in registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesResponse {
    pub types: Vec<TypeJson>,
}

// =============================================================================
// TRUTH VALUES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthJson {
    pub strength: f64,
    pub confidence: f64,
}

impl TruthJson {
    /// Validate into a truth value.
    pub fn to_truth(self) -> Result<TruthValue, AtomSpaceError> {
        TruthValue::new(self.strength, self.confidence)
    }
}

impl From<TruthValue> for TruthJson {
    fn from(tv: TruthValue) -> Self {
        Self {
            strength: tv.strength(),
            confidence: tv.confidence(),
        }
    }
}

/// Truth value of one atom; `truth` is `null` when unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruthResponse {
    pub handle: u64,
    pub truth: Option<TruthJson>,
}

/// Truth update for `PUT /atoms/{handle}/truth`.
///
/// `truth: null` clears the value. Otherwise the value is revised with the
/// observation, or overwritten when `replace` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruthUpdateRequest {
    pub truth: Option<TruthJson>,
    #[serde(default)]
    pub replace: bool,
}

// =============================================================================
// ATOMS
// =============================================================================

/// Nested atom description.
///
/// ```json
/// {"type": "Categorization", "outgoing": [
///     {"type": "Concept", "name": "Walmart"},
///     {"handle": 1}
/// ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AtomSpecJson {
    Handle {
        handle: u64,
    },
    Node {
        #[serde(rename = "type")]
        atom_type: String,
        name: String,
    },
    Link {
        #[serde(rename = "type")]
        atom_type: String,
        outgoing: Vec<AtomSpecJson>,
    },
}

impl AtomSpecJson {
    #[must_use]
    pub fn to_spec(&self) -> AtomSpec {
        match self {
            Self::Handle { handle } => AtomSpec::Existing(Handle(*handle)),
            Self::Node { atom_type, name } => AtomSpec::node(atom_type, name),
            Self::Link {
                atom_type,
                outgoing,
            } => AtomSpec::link(atom_type, outgoing.iter().map(Self::to_spec).collect()),
        }
    }
}

/// Atom insert request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRequest {
    pub atom: AtomSpecJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truth: Option<TruthJson>,
}

/// Atom insert response. `created` is false when a duplicate was suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResponse {
    pub handle: u64,
    pub created: bool,
}

/// A stored atom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomJson {
    pub handle: u64,
    #[serde(rename = "type")]
    pub atom_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<Vec<u64>>,
    pub truth: Option<TruthJson>,
}

impl AtomJson {
    #[must_use]
    pub fn new(atom: &Atom, atom_type: String, truth: Option<TruthValue>) -> Self {
        Self {
            handle: atom.handle.value(),
            atom_type,
            name: atom.name().map(str::to_string),
            outgoing: atom
                .is_link()
                .then(|| atom.outgoing().iter().map(|h| h.value()).collect()),
            truth: truth.map(TruthJson::from),
        }
    }
}

/// `?subtypes=true` on `GET /types/{name}/atoms`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ByTypeParams {
    #[serde(default)]
    pub subtypes: bool,
}

/// `?cascade=true` on `DELETE /atoms/{handle}`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RemoveParams {
    #[serde(default)]
    pub cascade: bool,
}

/// A list of handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlesResponse {
    pub handles: Vec<u64>,
}

impl From<Vec<Handle>> for HandlesResponse {
    fn from(handles: Vec<Handle>) -> Self {
        Self {
            handles: handles.into_iter().map(Handle::value).collect(),
        }
    }
}

/// Removal response: every handle removed, dependents first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub removed: Vec<u64>,
}

// =============================================================================
// QUERY REQUEST/RESPONSE
// =============================================================================

/// Pattern term.
///
/// - `{"handle": 3}`
/// - `{"var": "$X"}` or `{"var": "$X", "type": "Concept"}`
/// - `{"type": "Concept", "name": "Walmart"}`
/// - `{"type": "Categorization", "outgoing": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternTermJson {
    Handle {
        handle: u64,
    },
    Variable {
        var: String,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        type_restriction: Option<String>,
    },
    Node {
        #[serde(rename = "type")]
        atom_type: String,
        name: String,
    },
    Link {
        #[serde(rename = "type")]
        atom_type: String,
        outgoing: Vec<PatternTermJson>,
    },
}

impl PatternTermJson {
    #[must_use]
    pub fn to_term(&self) -> PatternTerm {
        match self {
            Self::Handle { handle } => PatternTerm::handle(Handle(*handle)),
            Self::Variable {
                var,
                type_restriction,
            } => match type_restriction {
                Some(t) => PatternTerm::typed_var(var, t),
                None => PatternTerm::var(var),
            },
            Self::Node { atom_type, name } => PatternTerm::node(atom_type, name),
            Self::Link {
                atom_type,
                outgoing,
            } => PatternTerm::link(atom_type, outgoing.iter().map(Self::to_term).collect()),
        }
    }
}

/// Constraint target: `{"var": "$X"}` or `{"clause": 0}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetJson {
    Var { var: String },
    Clause { clause: usize },
}

impl TargetJson {
    #[must_use]
    pub fn to_target(&self) -> Target {
        match self {
            Self::Var { var } => Target::var(var),
            Self::Clause { clause } => Target::clause(*clause),
        }
    }
}

/// Query constraint (tagged by `kind`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintJson {
    TruthAtLeast {
        target: TargetJson,
        #[serde(default)]
        min_strength: f64,
        #[serde(default)]
        min_confidence: f64,
    },
    TypeIs {
        target: TargetJson,
        #[serde(rename = "type")]
        atom_type: String,
        #[serde(default)]
        include_subtypes: bool,
    },
    Distinct {
        a: String,
        b: String,
    },
}

impl ConstraintJson {
    #[must_use]
    pub fn to_constraint(&self) -> Constraint {
        match self {
            Self::TruthAtLeast {
                target,
                min_strength,
                min_confidence,
            } => Constraint::truth_at_least(target.to_target(), *min_strength, *min_confidence),
            Self::TypeIs {
                target,
                atom_type,
                include_subtypes,
            } => Constraint::type_is(target.to_target(), atom_type, *include_subtypes),
            Self::Distinct { a, b } => Constraint::distinct(a, b),
        }
    }
}

/// Pattern query request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub clauses: Vec<PatternTermJson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
}

impl QueryRequest {
    /// Build the engine query. Requested caps are clamped to `caps`.
    #[must_use]
    pub fn to_query(&self, caps: QueryLimits) -> Query {
        let mut pattern = Pattern::new();
        for clause in &self.clauses {
            pattern = pattern.clause(clause.to_term());
        }
        for constraint in &self.constraints {
            pattern = pattern.constraint(constraint.to_constraint());
        }
        Query::new(pattern).with_limits(QueryLimits {
            max_results: clamp(self.max_results, caps.max_results),
            max_steps: clamp(self.max_steps, caps.max_steps),
        })
    }
}

fn clamp(requested: Option<usize>, cap: Option<usize>) -> Option<usize> {
    match (requested, cap) {
        (Some(r), Some(c)) => Some(r.min(c)),
        (r, c) => r.or(c),
    }
}

/// One solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingJson {
    pub values: BTreeMap<String, u64>,
    /// Atom matched by each clause, in request order.
    pub groundings: Vec<u64>,
}

impl From<&Bindings> for BindingJson {
    fn from(b: &Bindings) -> Self {
        Self {
            values: b
                .values()
                .iter()
                .map(|(name, h)| (name.clone(), h.value()))
                .collect(),
            groundings: b.groundings().iter().map(|h| h.value()).collect(),
        }
    }
}

/// Pattern query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub count: usize,
    pub bindings: Vec<BindingJson>,
    /// True if the step cap stopped the search early.
    pub budget_exhausted: bool,
    /// True if more solutions exist beyond the result cap.
    #[serde(default)]
    pub truncated: bool,
}

// =============================================================================
// SCRIPTS
// =============================================================================

/// A batch of operations run by `atomspace run`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptJson {
    #[serde(default)]
    pub types: Vec<TypeJson>,
    #[serde(default)]
    pub atoms: Vec<InsertRequest>,
    #[serde(default)]
    pub queries: Vec<QueryRequest>,
}

/// Output of a script run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptReport {
    pub atoms: Vec<InsertResponse>,
    pub queries: Vec<QueryResponse>,
}
