//! # Search Plan
//!
//! Compiles a [`Pattern`] against a store.
//!
//! Compilation resolves every type name, looks up ground sub-terms, assigns
//! each variable a slot, orders the clauses and schedules each constraint at
//! the first search depth where all of its targets are bound.
//!
//! Clause ordering is greedy: at each step pick the clause with the fewest
//! still-unbound variables, preferring clauses anchored on a ground or bound
//! member, then the smallest static candidate estimate, then the earliest
//! clause.

use super::{Constraint, Pattern, PatternTerm, Target};
use crate::primitives::{MAX_CLAUSES, MAX_TERM_DEPTH};
use crate::store::HypergraphStore;
use crate::truth::TruthValue;
use crate::types::{AtomKey, AtomSpaceError, Handle, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::GroundedAtom;

type PredicateFn = dyn Fn(&[GroundedAtom<'_>]) -> bool + Send + Sync;

/// A compiled clause term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Term {
    Ground(Handle),
    Var(usize),
    Link { type_id: TypeId, outgoing: Vec<Term> },
}

impl Term {
    fn collect_slots(&self, out: &mut Vec<usize>) {
        match self {
            Self::Ground(_) => {}
            Self::Var(slot) => {
                if !out.contains(slot) {
                    out.push(*slot);
                }
            }
            Self::Link { outgoing, .. } => {
                for child in outgoing {
                    child.collect_slots(out);
                }
            }
        }
    }

    fn slots(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_slots(&mut out);
        out
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VarSlot {
    pub(crate) name: String,
    pub(crate) restriction: Option<TypeId>,
}

/// Where a check reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Var(usize),
    Clause(usize),
}

#[derive(Clone)]
pub(crate) enum Check {
    TruthAtLeast {
        slot: Slot,
        min_strength: f64,
        min_confidence: f64,
    },
    TypeIs {
        slot: Slot,
        type_id: TypeId,
        include_subtypes: bool,
    },
    Distinct(usize, usize),
    Predicate {
        slots: Vec<Slot>,
        test: Arc<PredicateFn>,
    },
}

impl Check {
    fn slots(&self) -> Vec<Slot> {
        match self {
            Self::TruthAtLeast { slot, .. } | Self::TypeIs { slot, .. } => vec![*slot],
            Self::Distinct(a, b) => vec![Slot::Var(*a), Slot::Var(*b)],
            Self::Predicate { slots, .. } => slots.clone(),
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruthAtLeast {
                slot,
                min_strength,
                min_confidence,
            } => f
                .debug_struct("TruthAtLeast")
                .field("slot", slot)
                .field("min_strength", min_strength)
                .field("min_confidence", min_confidence)
                .finish(),
            Self::TypeIs {
                slot,
                type_id,
                include_subtypes,
            } => f
                .debug_struct("TypeIs")
                .field("slot", slot)
                .field("type_id", type_id)
                .field("include_subtypes", include_subtypes)
                .finish(),
            Self::Distinct(a, b) => f.debug_tuple("Distinct").field(a).field(b).finish(),
            Self::Predicate { slots, .. } => {
                f.debug_struct("Predicate").field("slots", slots).finish()
            }
        }
    }
}

/// A pattern compiled against one store state.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub(crate) vars: Vec<VarSlot>,
    /// Compiled clauses, in original order.
    pub(crate) clauses: Vec<Term>,
    /// Search depth → original clause index.
    pub(crate) order: Vec<usize>,
    pub(crate) checks: Vec<Check>,
    /// Search depth → checks that become decidable there.
    pub(crate) checks_at: Vec<Vec<usize>>,
}

impl SearchPlan {
    fn empty(vars: Vec<VarSlot>) -> Self {
        Self {
            vars,
            clauses: Vec::new(),
            order: Vec::new(),
            checks: Vec::new(),
            checks_at: Vec::new(),
        }
    }

    /// Variable names, in slot order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|v| v.name.as_str())
    }

    /// Original clause indices in the order they will be searched.
    #[must_use]
    pub fn clause_order(&self) -> &[usize] {
        &self.order
    }

    /// True if the plan provably has no solutions (no clauses, or a ground
    /// sub-term that is not stored).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// =============================================================================
// COMPILATION
// =============================================================================

struct Compiler<'s, S: ?Sized> {
    store: &'s S,
    vars: Vec<VarSlot>,
    by_name: BTreeMap<String, usize>,
}

impl<S: HypergraphStore + ?Sized> Compiler<'_, S> {
    fn resolve_type(&self, name: &str) -> Result<TypeId, AtomSpaceError> {
        self.store.types().resolve(name)
    }

    /// Compile one term. `Ok(None)` means a ground sub-term is not stored.
    fn term(&mut self, term: &PatternTerm, depth: usize) -> Result<Option<Term>, AtomSpaceError> {
        if depth > MAX_TERM_DEPTH {
            return Err(AtomSpaceError::InvalidPattern(format!(
                "clause nested deeper than {}",
                MAX_TERM_DEPTH
            )));
        }
        match term {
            PatternTerm::Handle(h) => Ok(self.store.contains(*h).then_some(Term::Ground(*h))),
            PatternTerm::Node { atom_type, name } => {
                let type_id = self.resolve_type(atom_type)?;
                if self.store.types().is_a(type_id, TypeId::VARIABLE) {
                    return Err(AtomSpaceError::InvalidPattern(format!(
                        "{} {} used as a ground node; declare it as a variable",
                        atom_type, name
                    )));
                }
                Ok(self
                    .store
                    .lookup(&AtomKey::node(type_id, name.as_str()))
                    .map(Term::Ground))
            }
            PatternTerm::Variable(var) => {
                if var.name.is_empty() {
                    return Err(AtomSpaceError::InvalidPattern(
                        "variable name must not be empty".to_string(),
                    ));
                }
                let restriction = match &var.type_restriction {
                    Some(t) => Some(self.resolve_type(t)?),
                    None => None,
                };
                Ok(Some(Term::Var(self.bind_slot(&var.name, restriction)?)))
            }
            PatternTerm::Link {
                atom_type,
                outgoing,
            } => {
                let type_id = self.resolve_type(atom_type)?;
                let mut members = Vec::with_capacity(outgoing.len());
                let mut absent = false;
                for child in outgoing {
                    // Keep compiling after an absent member so every type and
                    // variable in the clause is still validated.
                    match self.term(child, depth + 1)? {
                        Some(t) => members.push(t),
                        None => absent = true,
                    }
                }
                if absent {
                    return Ok(None);
                }
                let ground: Option<Vec<Handle>> = members
                    .iter()
                    .map(|m| match m {
                        Term::Ground(h) => Some(*h),
                        _ => None,
                    })
                    .collect();
                match ground {
                    Some(handles) => Ok(self
                        .store
                        .lookup(&AtomKey::link(type_id, handles))
                        .map(Term::Ground)),
                    None => Ok(Some(Term::Link {
                        type_id,
                        outgoing: members,
                    })),
                }
            }
        }
    }

    fn bind_slot(&mut self, name: &str, restriction: Option<TypeId>) -> Result<usize, AtomSpaceError> {
        if let Some(&slot) = self.by_name.get(name) {
            let existing = &mut self.vars[slot];
            match (existing.restriction, restriction) {
                (Some(a), Some(b)) if a != b => {
                    return Err(AtomSpaceError::InvalidPattern(format!(
                        "variable {} declared with conflicting types",
                        name
                    )));
                }
                (None, Some(b)) => existing.restriction = Some(b),
                _ => {}
            }
            return Ok(slot);
        }
        let slot = self.vars.len();
        self.vars.push(VarSlot {
            name: name.to_string(),
            restriction,
        });
        self.by_name.insert(name.to_string(), slot);
        Ok(slot)
    }

    fn slot(&self, target: &Target, clause_count: usize) -> Result<Slot, AtomSpaceError> {
        match target {
            Target::Variable(name) => self
                .by_name
                .get(name)
                .map(|s| Slot::Var(*s))
                .ok_or_else(|| AtomSpaceError::UnboundVariable(name.clone())),
            Target::Clause(index) if *index < clause_count => Ok(Slot::Clause(*index)),
            Target::Clause(index) => Err(AtomSpaceError::InvalidPattern(format!(
                "constraint targets clause {} of {}",
                index, clause_count
            ))),
        }
    }

    fn var_slot(&self, name: &str) -> Result<usize, AtomSpaceError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| AtomSpaceError::UnboundVariable(name.to_string()))
    }

    fn check(&self, constraint: &Constraint, clause_count: usize) -> Result<Check, AtomSpaceError> {
        match constraint {
            Constraint::TruthAtLeast {
                target,
                min_strength,
                min_confidence,
            } => {
                // Thresholds follow the same range rules as truth values.
                TruthValue::new(*min_strength, *min_confidence)?;
                Ok(Check::TruthAtLeast {
                    slot: self.slot(target, clause_count)?,
                    min_strength: *min_strength,
                    min_confidence: *min_confidence,
                })
            }
            Constraint::TypeIs {
                target,
                atom_type,
                include_subtypes,
            } => Ok(Check::TypeIs {
                slot: self.slot(target, clause_count)?,
                type_id: self.resolve_type(atom_type)?,
                include_subtypes: *include_subtypes,
            }),
            Constraint::Distinct(a, b) => Ok(Check::Distinct(self.var_slot(a)?, self.var_slot(b)?)),
            Constraint::Predicate(predicate) => {
                let slots = predicate
                    .targets()
                    .iter()
                    .map(|t| self.slot(t, clause_count))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Check::Predicate {
                    slots,
                    test: predicate.test(),
                })
            }
        }
    }
}

/// Compile `pattern` against `store`.
///
/// Errors: `TypeUndeclared` for unknown type names, `UnboundVariable` for a
/// constraint naming a variable no clause introduces, `InvalidPattern` for
/// structural problems. A pattern that cannot match (no clauses, or a ground
/// sub-term not in the store) compiles to an empty plan.
pub fn compile<S: HypergraphStore + ?Sized>(
    store: &S,
    pattern: &Pattern,
) -> Result<SearchPlan, AtomSpaceError> {
    let clause_count = pattern.clauses().len();
    if clause_count > MAX_CLAUSES {
        return Err(AtomSpaceError::InvalidPattern(format!(
            "{} clauses exceeds maximum {}",
            clause_count, MAX_CLAUSES
        )));
    }

    let mut compiler = Compiler {
        store,
        vars: Vec::new(),
        by_name: BTreeMap::new(),
    };

    let mut clauses = Vec::with_capacity(clause_count);
    let mut satisfiable = true;
    for clause in pattern.clauses() {
        match compiler.term(clause, 0)? {
            Some(term) => clauses.push(term),
            None => satisfiable = false,
        }
    }

    let checks = pattern
        .constraints()
        .iter()
        .map(|c| compiler.check(c, clause_count))
        .collect::<Result<Vec<_>, _>>()?;

    let vars = compiler.vars;
    if !satisfiable || clauses.is_empty() {
        tracing::debug!(clauses = clause_count, "pattern cannot match");
        return Ok(SearchPlan::empty(vars));
    }

    let order = order_clauses(store, &vars, &clauses);
    let checks_at = schedule_checks(&order, &clauses, &checks, vars.len());

    tracing::debug!(
        clauses = clause_count,
        variables = vars.len(),
        constraints = checks.len(),
        order = ?order,
        "pattern compiled"
    );

    Ok(SearchPlan {
        vars,
        clauses,
        order,
        checks,
        checks_at,
    })
}

// =============================================================================
// CLAUSE ORDERING
// =============================================================================

fn order_clauses<S: HypergraphStore + ?Sized>(
    store: &S,
    vars: &[VarSlot],
    clauses: &[Term],
) -> Vec<usize> {
    let slots: Vec<Vec<usize>> = clauses.iter().map(Term::slots).collect();
    let mut bound = vec![false; vars.len()];
    let mut remaining: Vec<usize> = (0..clauses.len()).collect();
    let mut order = Vec::with_capacity(clauses.len());

    while !remaining.is_empty() {
        let mut best: Option<(usize, (usize, bool, usize, usize))> = None;
        for (pos, &clause) in remaining.iter().enumerate() {
            let unbound = slots[clause].iter().filter(|s| !bound[**s]).count();
            let anchored = is_anchored(&clauses[clause], &bound);
            let estimate = estimate(store, vars, &clauses[clause], &bound);
            let rank = (unbound, !anchored, estimate, clause);
            if best.as_ref().is_none_or(|(_, r)| rank < *r) {
                best = Some((pos, rank));
            }
        }
        let Some((pos, _)) = best else { break };
        let clause = remaining.remove(pos);
        for slot in &slots[clause] {
            bound[*slot] = true;
        }
        order.push(clause);
    }
    order
}

fn is_anchored(term: &Term, bound: &[bool]) -> bool {
    match term {
        Term::Ground(_) => true,
        Term::Var(slot) => bound[*slot],
        Term::Link { outgoing, .. } => outgoing.iter().any(|child| match child {
            Term::Ground(_) => true,
            Term::Var(slot) => bound[*slot],
            Term::Link { .. } => false,
        }),
    }
}

/// Static upper bound on the candidates the matcher will seed for `term`.
fn estimate<S: HypergraphStore + ?Sized>(
    store: &S,
    vars: &[VarSlot],
    term: &Term,
    bound: &[bool],
) -> usize {
    match term {
        Term::Ground(_) => 1,
        Term::Var(slot) if bound[*slot] => 1,
        Term::Var(slot) => match vars[*slot].restriction {
            Some(ty) => store
                .types()
                .subtypes(ty)
                .into_iter()
                .map(|t| store.count_of_type(t))
                .sum(),
            None => store.atom_count(),
        },
        Term::Link { type_id, outgoing } => {
            let by_type = store.count_of_type(*type_id);
            outgoing
                .iter()
                .filter_map(|child| match child {
                    Term::Ground(h) => store.incoming(*h).map(|set| set.len()),
                    _ => None,
                })
                .min()
                .map_or(by_type, |anchored| anchored.min(by_type))
        }
    }
}

fn schedule_checks(
    order: &[usize],
    clauses: &[Term],
    checks: &[Check],
    var_count: usize,
) -> Vec<Vec<usize>> {
    // Depth at which each variable and each clause first becomes bound.
    let mut var_depth = vec![usize::MAX; var_count];
    let mut clause_depth = vec![usize::MAX; clauses.len()];
    for (depth, &clause) in order.iter().enumerate() {
        clause_depth[clause] = depth;
        for slot in clauses[clause].slots() {
            if var_depth[slot] == usize::MAX {
                var_depth[slot] = depth;
            }
        }
    }

    let mut checks_at = vec![Vec::new(); order.len()];
    let last = order.len().saturating_sub(1);
    for (index, check) in checks.iter().enumerate() {
        let ready = check
            .slots()
            .iter()
            .map(|slot| match slot {
                Slot::Var(v) => var_depth[*v],
                Slot::Clause(c) => clause_depth[*c],
            })
            .max()
            .unwrap_or(0)
            .min(last);
        checks_at[ready].push(index);
    }
    checks_at
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AtomTable;

    fn store() -> (AtomTable, Handle, Handle) {
        let mut table = AtomTable::new();
        table.register_type("Concept", Some("Node")).expect("concept");
        table
            .register_type("Categorization", Some("Link"))
            .expect("categorization");
        table.register_type("Inheritance", Some("Link")).expect("inh");
        let w = table.add_node("Concept", "Walmart").expect("w");
        let g = table.add_node("Concept", "Groceries").expect("g");
        table.add_link("Categorization", &[w, g]).expect("link");
        (table, w, g)
    }

    #[test]
    fn ground_node_resolves_to_handle() {
        let (table, w, _) = store();
        let pattern = Pattern::new().clause(PatternTerm::link(
            "Categorization",
            vec![PatternTerm::node("Concept", "Walmart"), PatternTerm::var("$X")],
        ));
        let plan = compile(&table, &pattern).expect("compile");
        assert_eq!(
            plan.clauses[0],
            Term::Link {
                type_id: table.resolve_type("Categorization").expect("t"),
                outgoing: vec![Term::Ground(w), Term::Var(0)],
            }
        );
        assert_eq!(plan.variables().collect::<Vec<_>>(), vec!["$X"]);
    }

    #[test]
    fn missing_ground_atom_gives_empty_plan() {
        let (table, _, _) = store();
        let pattern = Pattern::new().clause(PatternTerm::link(
            "Categorization",
            vec![PatternTerm::node("Concept", "Target"), PatternTerm::var("$X")],
        ));
        let plan = compile(&table, &pattern).expect("compile");
        assert!(plan.is_empty());
    }

    #[test]
    fn zero_clauses_gives_empty_plan() {
        let (table, _, _) = store();
        assert!(compile(&table, &Pattern::new()).expect("compile").is_empty());
    }

    #[test]
    fn undeclared_type_rejected() {
        let (table, _, _) = store();
        let pattern = Pattern::new().clause(PatternTerm::link("Payment", vec![PatternTerm::var("$X")]));
        assert_eq!(
            compile(&table, &pattern).err(),
            Some(AtomSpaceError::TypeUndeclared("Payment".into()))
        );
    }

    #[test]
    fn constraint_on_unknown_variable_rejected() {
        let (table, _, _) = store();
        let pattern = Pattern::new()
            .clause(PatternTerm::link(
                "Categorization",
                vec![PatternTerm::var("$X"), PatternTerm::var("$Y")],
            ))
            .constraint(Constraint::truth_at_least(Target::var("$Z"), 0.5, 0.5));
        assert_eq!(
            compile(&table, &pattern).err(),
            Some(AtomSpaceError::UnboundVariable("$Z".into()))
        );
    }

    #[test]
    fn unbound_variable_reported_even_without_clauses() {
        let (table, _, _) = store();
        let pattern = Pattern::new().constraint(Constraint::distinct("$A", "$B"));
        assert!(matches!(
            compile(&table, &pattern),
            Err(AtomSpaceError::UnboundVariable(_))
        ));
    }

    #[test]
    fn clause_target_out_of_range_rejected() {
        let (table, _, _) = store();
        let pattern = Pattern::new()
            .clause(PatternTerm::var("$X"))
            .constraint(Constraint::truth_at_least(Target::clause(3), 0.0, 0.0));
        assert!(matches!(
            compile(&table, &pattern),
            Err(AtomSpaceError::InvalidPattern(_))
        ));
    }

    #[test]
    fn conflicting_variable_types_rejected() {
        let (table, _, _) = store();
        let pattern = Pattern::new().clause(PatternTerm::link(
            "Categorization",
            vec![
                PatternTerm::typed_var("$X", "Concept"),
                PatternTerm::typed_var("$X", "Link"),
            ],
        ));
        assert!(matches!(
            compile(&table, &pattern),
            Err(AtomSpaceError::InvalidPattern(_))
        ));
    }

    #[test]
    fn anchored_clause_searched_first() {
        let (table, _, _) = store();
        let pattern = Pattern::new()
            .clause(PatternTerm::link(
                "Inheritance",
                vec![PatternTerm::var("$C"), PatternTerm::var("$P")],
            ))
            .clause(PatternTerm::link(
                "Categorization",
                vec![PatternTerm::node("Concept", "Walmart"), PatternTerm::var("$C")],
            ));
        let plan = compile(&table, &pattern).expect("compile");
        assert_eq!(plan.clause_order(), &[1, 0]);
    }

    #[test]
    fn checks_scheduled_when_targets_bound() {
        let (table, _, _) = store();
        let pattern = Pattern::new()
            .clause(PatternTerm::link(
                "Categorization",
                vec![PatternTerm::node("Concept", "Walmart"), PatternTerm::var("$C")],
            ))
            .clause(PatternTerm::link(
                "Inheritance",
                vec![PatternTerm::var("$C"), PatternTerm::var("$P")],
            ))
            .constraint(Constraint::truth_at_least(Target::clause(0), 0.5, 0.5))
            .constraint(Constraint::distinct("$C", "$P"));
        let plan = compile(&table, &pattern).expect("compile");
        assert_eq!(plan.clause_order(), &[0, 1]);
        assert_eq!(plan.checks_at, vec![vec![0], vec![1]]);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let (table, _, _) = store();
        let pattern = Pattern::new()
            .clause(PatternTerm::var("$X"))
            .constraint(Constraint::truth_at_least(Target::var("$X"), 1.5, 0.0));
        assert!(matches!(
            compile(&table, &pattern),
            Err(AtomSpaceError::InvalidTruthValue { .. })
        ));
    }
}
