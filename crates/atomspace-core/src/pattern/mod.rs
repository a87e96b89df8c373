//! # Pattern Matching
//!
//! Query patterns over the hypergraph.
//!
//! A [`Pattern`] is a conjunction of clauses plus optional constraints. Each
//! clause is a [`PatternTerm`] tree whose leaves are ground atoms or
//! variables. Matching a pattern yields one [`Bindings`] per distinct
//! assignment of variables to handles that makes every clause a stored atom
//! and satisfies every constraint.
//!
//! - [`plan`] compiles a pattern against a store into a [`SearchPlan`]
//! - [`matcher`] runs the plan as a depth-first search over an explicit
//!   choice-point stack
//!
//! Link and node terms match their exact type. Variable type restrictions
//! and `TypeIs` constraints honour the hierarchy.

pub mod matcher;
pub mod plan;

pub use matcher::{Bindings, Matches, match_all};
pub use plan::{SearchPlan, compile};

use crate::truth::TruthValue;
use crate::types::{AtomKey, Handle};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// TERMS
// =============================================================================

/// A pattern variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    /// If set, the variable only binds atoms of this type or a subtype.
    pub type_restriction: Option<String>,
}

/// One node of a clause tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternTerm {
    /// A specific stored atom.
    Handle(Handle),
    /// A ground node, looked up by type and name.
    Node { atom_type: String, name: String },
    /// A variable leaf.
    Variable(Variable),
    /// A link whose members are themselves terms.
    Link {
        atom_type: String,
        outgoing: Vec<PatternTerm>,
    },
}

impl PatternTerm {
    #[must_use]
    pub fn handle(handle: Handle) -> Self {
        Self::Handle(handle)
    }

    #[must_use]
    pub fn node(atom_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Node {
            atom_type: atom_type.into(),
            name: name.into(),
        }
    }

    /// An unrestricted variable.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(Variable {
            name: name.into(),
            type_restriction: None,
        })
    }

    /// A variable restricted to a type and its subtypes.
    #[must_use]
    pub fn typed_var(name: impl Into<String>, atom_type: impl Into<String>) -> Self {
        Self::Variable(Variable {
            name: name.into(),
            type_restriction: Some(atom_type.into()),
        })
    }

    #[must_use]
    pub fn link(atom_type: impl Into<String>, outgoing: Vec<PatternTerm>) -> Self {
        Self::Link {
            atom_type: atom_type.into(),
            outgoing,
        }
    }

    /// Names of the variables in this term, in first-occurrence order.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Variable(v) => {
                if !out.contains(&v.name.as_str()) {
                    out.push(&v.name);
                }
            }
            Self::Link { outgoing, .. } => {
                for term in outgoing {
                    term.collect_variables(out);
                }
            }
            Self::Handle(_) | Self::Node { .. } => {}
        }
    }
}

// =============================================================================
// CONSTRAINTS
// =============================================================================

/// What a constraint inspects: a variable's binding or a clause's grounding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Variable(String),
    /// Index into the pattern's clauses, in the order they were added.
    Clause(usize),
}

impl Target {
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    #[must_use]
    pub const fn clause(index: usize) -> Self {
        Self::Clause(index)
    }
}

/// An atom handed to a [`Predicate`].
#[derive(Debug, Clone, Copy)]
pub struct GroundedAtom<'a> {
    pub handle: Handle,
    pub key: &'a AtomKey,
    pub truth: Option<TruthValue>,
}

type PredicateFn = dyn Fn(&[GroundedAtom<'_>]) -> bool + Send + Sync;

/// Caller-supplied test over grounded targets.
///
/// The closure receives one [`GroundedAtom`] per target, in target order.
#[derive(Clone)]
pub struct Predicate {
    label: String,
    targets: Vec<Target>,
    test: Arc<PredicateFn>,
}

impl Predicate {
    pub fn new<F>(label: impl Into<String>, targets: Vec<Target>, test: F) -> Self
    where
        F: Fn(&[GroundedAtom<'_>]) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            targets,
            test: Arc::new(test),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub(crate) fn test(&self) -> Arc<PredicateFn> {
        Arc::clone(&self.test)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("label", &self.label)
            .field("targets", &self.targets)
            .finish()
    }
}

/// Filter applied to candidate assignments.
///
/// Each constraint is checked as soon as everything it targets is bound.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// The target has a known truth value meeting both minimums.
    TruthAtLeast {
        target: Target,
        min_strength: f64,
        min_confidence: f64,
    },
    /// The target's type is `atom_type` (or a subtype when `include_subtypes`).
    TypeIs {
        target: Target,
        atom_type: String,
        include_subtypes: bool,
    },
    /// Two variables bind different atoms.
    Distinct(String, String),
    Predicate(Predicate),
}

impl Constraint {
    #[must_use]
    pub fn truth_at_least(target: Target, min_strength: f64, min_confidence: f64) -> Self {
        Self::TruthAtLeast {
            target,
            min_strength,
            min_confidence,
        }
    }

    #[must_use]
    pub fn type_is(target: Target, atom_type: impl Into<String>, include_subtypes: bool) -> Self {
        Self::TypeIs {
            target,
            atom_type: atom_type.into(),
            include_subtypes,
        }
    }

    #[must_use]
    pub fn distinct(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::Distinct(a.into(), b.into())
    }
}

// =============================================================================
// PATTERN
// =============================================================================

/// A conjunction of clauses with optional constraints.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    clauses: Vec<PatternTerm>,
    constraints: Vec<Constraint>,
}

impl Pattern {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause.
    #[must_use]
    pub fn clause(mut self, term: PatternTerm) -> Self {
        self.clauses.push(term);
        self
    }

    /// Append a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn clauses(&self) -> &[PatternTerm] {
        &self.clauses
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Distinct variable names across all clauses, first occurrence first.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for clause in &self.clauses {
            clause.collect_variables(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_in_first_occurrence_order() {
        let pattern = Pattern::new()
            .clause(PatternTerm::link(
                "Categorization",
                vec![PatternTerm::var("$M"), PatternTerm::var("$C")],
            ))
            .clause(PatternTerm::link(
                "Inheritance",
                vec![PatternTerm::var("$C"), PatternTerm::var("$P")],
            ));
        assert_eq!(pattern.variables(), vec!["$M", "$C", "$P"]);
    }

    #[test]
    fn predicate_debug_hides_closure() {
        let p = Predicate::new("always", vec![Target::clause(0)], |_| true);
        let shown = format!("{:?}", p);
        assert!(shown.contains("always"));
        assert!(!shown.contains("test"));
    }

    #[test]
    fn ground_terms_have_no_variables() {
        let term = PatternTerm::link(
            "Categorization",
            vec![PatternTerm::node("Concept", "Walmart"), PatternTerm::handle(Handle(2))],
        );
        assert!(term.variables().is_empty());
    }
}
