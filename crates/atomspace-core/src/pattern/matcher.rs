//! # Matcher
//!
//! Depth-first backtracking over a [`SearchPlan`].
//!
//! The search keeps an explicit stack of choice points, one per plan depth.
//! Each choice point owns its candidate list, a cursor into it, and the
//! length the binding trail had when the depth was entered. Moving to the
//! next candidate truncates the trail back to that mark, which unbinds every
//! variable the previous candidate bound.
//!
//! Recursion follows only the pattern's term structure, never stored data,
//! so cycles or deep chains in the store cannot make the search loop.

use super::GroundedAtom;
use super::plan::{Check, SearchPlan, Slot, Term, VarSlot};
use crate::query::{Query, QueryLimits};
use crate::store::{AtomTable, HypergraphStore};
use crate::types::{AtomSpaceError, Handle, Payload};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;
use std::sync::RwLockReadGuard;

// =============================================================================
// BINDINGS
// =============================================================================

/// One solution: variable → handle, plus the atom each clause matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bindings {
    values: BTreeMap<String, Handle>,
    groundings: Vec<Handle>,
}

impl Bindings {
    /// Handle bound to `variable`.
    #[must_use]
    pub fn get(&self, variable: &str) -> Option<Handle> {
        self.values.get(variable).copied()
    }

    /// All variable bindings, sorted by name.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, Handle> {
        &self.values
    }

    /// Atom matched by each clause, in the order the clauses were added.
    #[must_use]
    pub fn groundings(&self) -> &[Handle] {
        &self.groundings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// SEARCH STATE
// =============================================================================

#[derive(Debug)]
struct ChoicePoint {
    candidates: Vec<Handle>,
    cursor: usize,
    trail_mark: usize,
}

/// Variable assignment plus undo information.
#[derive(Debug)]
struct Frame {
    bindings: Vec<Option<Handle>>,
    trail: Vec<usize>,
    /// Original clause index → matched atom.
    groundings: Vec<Option<Handle>>,
}

impl Frame {
    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some(slot) = self.trail.pop() {
                self.bindings[slot] = None;
            }
        }
    }

    fn resolve(&self, slot: Slot) -> Option<Handle> {
        match slot {
            Slot::Var(v) => self.bindings[v],
            Slot::Clause(c) => self.groundings[c],
        }
    }
}

/// Resumable search over one plan.
#[derive(Debug)]
pub(crate) struct MatchState {
    plan: SearchPlan,
    limits: QueryLimits,
    frame: Frame,
    stack: Vec<ChoicePoint>,
    started: bool,
    done: bool,
    budget_exhausted: bool,
    steps: usize,
    yielded: usize,
}

impl MatchState {
    pub(crate) fn new(plan: SearchPlan, limits: QueryLimits) -> Self {
        let frame = Frame {
            bindings: vec![None; plan.vars.len()],
            trail: Vec::new(),
            groundings: vec![None; plan.clauses.len()],
        };
        Self {
            plan,
            limits,
            frame,
            stack: Vec::new(),
            started: false,
            done: false,
            budget_exhausted: false,
            steps: 0,
            yielded: 0,
        }
    }

    /// Produce the next solution, or `None` when the search is over.
    pub(crate) fn advance<S: HypergraphStore + ?Sized>(&mut self, store: &S) -> Option<Bindings> {
        if self.done {
            return None;
        }
        if self
            .limits
            .max_results
            .is_some_and(|max| self.yielded >= max)
        {
            self.done = true;
            return None;
        }
        if !self.started {
            self.started = true;
            if self.plan.order.is_empty() {
                self.done = true;
                return None;
            }
            let candidates = seed(&self.plan, store, &self.frame, 0);
            self.stack.push(ChoicePoint {
                candidates,
                cursor: 0,
                trail_mark: 0,
            });
        }

        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let Some(top) = self.stack.last_mut() else {
                self.done = true;
                return None;
            };
            let mark = top.trail_mark;
            let next = top.candidates.get(top.cursor).copied();
            top.cursor += 1;

            self.frame.undo_to(mark);
            let clause = self.plan.order[depth];
            self.frame.groundings[clause] = None;

            let Some(candidate) = next else {
                self.stack.pop();
                if self.stack.is_empty() {
                    self.done = true;
                    return None;
                }
                continue;
            };

            self.steps += 1;
            if self.limits.max_steps.is_some_and(|max| self.steps > max) {
                tracing::debug!(steps = self.steps, "query step budget exhausted");
                self.done = true;
                self.budget_exhausted = true;
                return None;
            }

            if !unify(
                &self.plan.vars,
                &self.plan.clauses[clause],
                candidate,
                store,
                &mut self.frame,
            ) {
                continue;
            }
            self.frame.groundings[clause] = Some(candidate);

            if !checks_pass(&self.plan, store, &self.frame, depth) {
                continue;
            }

            if depth + 1 == self.plan.order.len() {
                self.yielded += 1;
                return Some(self.solution());
            }

            let candidates = seed(&self.plan, store, &self.frame, depth + 1);
            self.stack.push(ChoicePoint {
                candidates,
                cursor: 0,
                trail_mark: self.frame.trail.len(),
            });
        }
    }

    fn solution(&self) -> Bindings {
        let values = self
            .plan
            .vars
            .iter()
            .zip(&self.frame.bindings)
            .filter_map(|(var, bound)| bound.map(|h| (var.name.clone(), h)))
            .collect();
        let groundings = self.frame.groundings.iter().flatten().copied().collect();
        Bindings { values, groundings }
    }

    pub(crate) fn plan(&self) -> &SearchPlan {
        &self.plan
    }
}

// =============================================================================
// CANDIDATES, UNIFICATION, CHECKS
// =============================================================================

/// Candidate atoms for the clause at `depth`, ascending by handle.
fn seed<S: HypergraphStore + ?Sized>(
    plan: &SearchPlan,
    store: &S,
    frame: &Frame,
    depth: usize,
) -> Vec<Handle> {
    let term = &plan.clauses[plan.order[depth]];
    match term {
        Term::Ground(h) => {
            if store.contains(*h) {
                vec![*h]
            } else {
                Vec::new()
            }
        }
        Term::Var(slot) => match frame.bindings[*slot] {
            Some(bound) => vec![bound],
            None => match plan.vars[*slot].restriction {
                Some(ty) => store.handles_of_type(ty, true),
                None => store.handles(),
            },
        },
        Term::Link { type_id, outgoing } => {
            let mut smallest: Option<&BTreeSet<Handle>> = None;
            for child in outgoing {
                let anchor = match child {
                    Term::Ground(h) => Some(*h),
                    Term::Var(slot) => frame.bindings[*slot],
                    Term::Link { .. } => None,
                };
                if let Some(anchor) = anchor {
                    match store.incoming(anchor) {
                        Some(set) => {
                            if smallest.is_none_or(|s| set.len() < s.len()) {
                                smallest = Some(set);
                            }
                        }
                        None => return Vec::new(),
                    }
                }
            }
            let shape = |h: &Handle| {
                store
                    .key(*h)
                    .is_some_and(|k| k.type_id == *type_id && k.outgoing().len() == outgoing.len())
            };
            match smallest {
                Some(set) => set.iter().copied().filter(shape).collect(),
                None => store
                    .handles_of_type(*type_id, false)
                    .into_iter()
                    .filter(shape)
                    .collect(),
            }
        }
    }
}

/// Try to make `term` equal to the stored atom `handle`, binding variables
/// on the way. New bindings are pushed on the trail.
fn unify<S: HypergraphStore + ?Sized>(
    vars: &[VarSlot],
    term: &Term,
    handle: Handle,
    store: &S,
    frame: &mut Frame,
) -> bool {
    match term {
        Term::Ground(g) => *g == handle,
        Term::Var(slot) => match frame.bindings[*slot] {
            Some(bound) => bound == handle,
            None => {
                let Some(key) = store.key(handle) else {
                    return false;
                };
                let admitted = vars[*slot]
                    .restriction
                    .is_none_or(|r| store.types().is_a(key.type_id, r));
                if !admitted {
                    return false;
                }
                frame.bindings[*slot] = Some(handle);
                frame.trail.push(*slot);
                true
            }
        },
        Term::Link { type_id, outgoing } => {
            let Some(key) = store.key(handle) else {
                return false;
            };
            if key.type_id != *type_id {
                return false;
            }
            let Payload::Link(members) = &key.payload else {
                return false;
            };
            members.len() == outgoing.len()
                && outgoing
                    .iter()
                    .zip(members)
                    .all(|(child, member)| unify(vars, child, *member, store, frame))
        }
    }
}

fn checks_pass<S: HypergraphStore + ?Sized>(
    plan: &SearchPlan,
    store: &S,
    frame: &Frame,
    depth: usize,
) -> bool {
    let Some(ready) = plan.checks_at.get(depth) else {
        return true;
    };
    ready
        .iter()
        .filter_map(|index| plan.checks.get(*index))
        .all(|check| check_passes(check, store, frame))
}

fn check_passes<S: HypergraphStore + ?Sized>(check: &Check, store: &S, frame: &Frame) -> bool {
    match check {
        Check::TruthAtLeast {
            slot,
            min_strength,
            min_confidence,
        } => frame
            .resolve(*slot)
            .and_then(|h| store.truth_value(h))
            .is_some_and(|tv| tv.meets(*min_strength, *min_confidence)),
        Check::TypeIs {
            slot,
            type_id,
            include_subtypes,
        } => frame
            .resolve(*slot)
            .and_then(|h| store.key(h))
            .is_some_and(|key| {
                key.type_id == *type_id
                    || (*include_subtypes && store.types().is_a(key.type_id, *type_id))
            }),
        Check::Distinct(a, b) => frame.bindings[*a] != frame.bindings[*b],
        Check::Predicate { slots, test } => {
            let mut atoms = Vec::with_capacity(slots.len());
            for slot in slots {
                let Some(handle) = frame.resolve(*slot) else {
                    return false;
                };
                let Some(key) = store.key(handle) else {
                    return false;
                };
                atoms.push(GroundedAtom {
                    handle,
                    key,
                    truth: store.truth_value(handle),
                });
            }
            test(&atoms)
        }
    }
}

// =============================================================================
// LAZY RESULTS
// =============================================================================

/// The store a [`Matches`] iterator reads from.
#[derive(Debug)]
pub(crate) enum StoreRef<'a> {
    /// Read lock held for the iterator's lifetime.
    Locked(RwLockReadGuard<'a, AtomTable>),
    Borrowed(&'a AtomTable),
}

impl Deref for StoreRef<'_> {
    type Target = AtomTable;

    fn deref(&self) -> &AtomTable {
        match self {
            Self::Locked(guard) => guard,
            Self::Borrowed(table) => table,
        }
    }
}

/// Lazy sequence of query solutions.
///
/// Each call to `next` resumes the search where the last solution was found.
/// The iterator keeps the store's read lock (or the snapshot it came from)
/// for its whole lifetime: drop it before mutating the store from the same
/// thread.
#[derive(Debug)]
pub struct Matches<'a> {
    store: StoreRef<'a>,
    state: MatchState,
}

impl<'a> Matches<'a> {
    pub(crate) fn new(store: StoreRef<'a>, plan: SearchPlan, limits: QueryLimits) -> Self {
        Self {
            store,
            state: MatchState::new(plan, limits),
        }
    }

    /// True if the search stopped because `max_steps` ran out, so more
    /// solutions may exist.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.state.budget_exhausted
    }

    /// Candidates tried so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.state.steps
    }

    /// The compiled plan being executed.
    #[must_use]
    pub fn plan(&self) -> &SearchPlan {
        self.state.plan()
    }
}

impl Iterator for Matches<'_> {
    type Item = Bindings;

    fn next(&mut self) -> Option<Bindings> {
        self.state.advance(&*self.store)
    }
}

/// Compile and run a query against any store, collecting every solution.
pub fn match_all<S: HypergraphStore + ?Sized>(
    store: &S,
    query: &Query,
) -> Result<Vec<Bindings>, AtomSpaceError> {
    let plan = super::compile(store, &query.pattern)?;
    let mut state = MatchState::new(plan, query.limits);
    let mut out = Vec::new();
    while let Some(bindings) = state.advance(store) {
        out.push(bindings);
    }
    Ok(out)
}

// =============================================================================
// TESTS
// =============================================================================
