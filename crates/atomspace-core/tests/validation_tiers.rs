//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the store is INVALID.
//!
//! ## Tiers
//! - T0: Atom Integrity (types, dedup, validation)
//! - T1: Referential Integrity (removal, cascade)
//! - T2: Single-Clause Matching
//! - T3: Multi-Clause Matching

use atomspace_core::{
    AtomSpace, AtomSpaceError, AtomSpec, Constraint, Handle, InsertOutcome, Pattern, PatternTerm,
    Query, Target, TruthValue,
};

/// The categorization scenario: Walmart is categorized as Groceries.
struct Scenario {
    space: AtomSpace,
    walmart: Handle,
    groceries: Handle,
    link: Handle,
}

fn scenario() -> Scenario {
    let space = AtomSpace::new();
    space.register_type("Concept", Some("Node")).expect("concept");
    space
        .register_type("Categorization", Some("Link"))
        .expect("categorization");

    let walmart = space.add_node("Concept", "Walmart").expect("walmart");
    let groceries = space.add_node("Concept", "Groceries").expect("groceries");
    let link = space
        .insert(
            &AtomSpec::link("Categorization", vec![walmart.into(), groceries.into()]),
            Some(TruthValue::new(0.85, 0.6).expect("tv")),
        )
        .expect("link");

    Scenario {
        space,
        walmart,
        groceries,
        link,
    }
}

fn walmart_pattern() -> Pattern {
    Pattern::new().clause(PatternTerm::link(
        "Categorization",
        vec![PatternTerm::node("Concept", "Walmart"), PatternTerm::var("$X")],
    ))
}

// =============================================================================
// TIER T0: ATOM INTEGRITY
// =============================================================================

mod t0_atom_integrity {
    use super::*;

    /// T0.1: Inserting an existing atom returns its canonical handle.
    #[test]
    fn duplicate_suppressed() {
        let s = scenario();
        let outcome = s
            .space
            .insert_with_outcome(&AtomSpec::node("Concept", "Walmart"), None)
            .expect("insert");
        assert_eq!(outcome, InsertOutcome::DuplicateSuppressed(s.walmart));
        assert_eq!(s.space.len(), 3);
    }

    /// T0.2: Atoms of undeclared types are refused.
    #[test]
    fn undeclared_type_refused() {
        let s = scenario();
        let result = s.space.add_node("Merchant", "Target");
        assert_eq!(result, Err(AtomSpaceError::TypeUndeclared("Merchant".into())));
    }

    /// T0.3: Type and name both take part in identity.
    #[test]
    fn identity_is_structural() {
        let s = scenario();
        s.space.register_type("Merchant", Some("Concept")).expect("merchant");
        let merchant = s.space.add_node("Merchant", "Walmart").expect("merchant");
        assert_ne!(merchant, s.walmart);
        let other = s.space.add_node("Concept", "walmart").expect("lowercase");
        assert_ne!(other, s.walmart);
    }

    /// T0.4: Truth values are unknown until set and revised afterwards.
    #[test]
    fn truth_value_lifecycle() {
        let s = scenario();
        assert_eq!(s.space.get_truth_value(s.walmart).expect("get"), None);
        let tv = s.space.get_truth_value(s.link).expect("get").expect("known");
        assert_eq!(tv, TruthValue::new(0.85, 0.6).expect("tv"));

        let revised = s.space.set_truth_value(s.link, 0.85, 0.6).expect("revise");
        assert!((revised.strength() - 0.85).abs() < 1e-12);
        assert!(revised.confidence() > 0.6);
    }

    /// T0.5: Operations on unknown handles report NotFound.
    #[test]
    fn unknown_handle_not_found() {
        let s = scenario();
        let ghost = Handle(999);
        assert_eq!(s.space.get(ghost), Err(AtomSpaceError::NotFound(ghost)));
        assert_eq!(s.space.get_incoming(ghost), Err(AtomSpaceError::NotFound(ghost)));
        assert_eq!(s.space.get_truth_value(ghost), Err(AtomSpaceError::NotFound(ghost)));
        assert!(s.space.remove(ghost).is_err());
    }
}

// =============================================================================
// TIER T1: REFERENTIAL INTEGRITY
// =============================================================================

mod t1_referential_integrity {
    use super::*;

    /// T1.1: Removing a referenced atom is refused, then allowed once the link is gone.
    #[test]
    fn remove_member_refused_then_allowed() {
        let s = scenario();
        let refused = s.space.remove(s.walmart);
        assert_eq!(
            refused,
            Err(AtomSpaceError::ReferentialIntegrityViolation {
                handle: s.walmart,
                referrers: vec![s.link],
            })
        );
        assert!(s.space.get(s.walmart).is_ok());

        s.space.remove(s.link).expect("remove link");
        s.space.remove(s.walmart).expect("remove walmart");
        assert!(s.space.get(s.walmart).is_err());
        assert_eq!(s.space.get_incoming(s.groceries).expect("incoming"), Vec::<Handle>::new());
        assert!(s.space.integrity_report().is_empty());
    }

    /// T1.2: Cascading removal takes the incoming closure with it.
    #[test]
    fn cascade_removes_closure() {
        let s = scenario();
        let removed = s.space.remove_cascade(s.walmart).expect("cascade");
        assert_eq!(removed, vec![s.link, s.walmart]);
        assert_eq!(s.space.len(), 1);
        assert!(s.space.get(s.groceries).is_ok());
    }

    /// T1.3: Incoming sets track link insertion.
    #[test]
    fn incoming_tracks_links() {
        let s = scenario();
        assert_eq!(s.space.get_incoming(s.walmart).expect("in"), vec![s.link]);
        assert_eq!(s.space.get_incoming(s.groceries).expect("in"), vec![s.link]);
        assert_eq!(s.space.get_incoming(s.link).expect("in"), Vec::<Handle>::new());
    }
}

// =============================================================================
// TIER T2: SINGLE-CLAUSE MATCHING
// =============================================================================

mod t2_single_clause {
    use super::*;

    /// T2.1: Categorization[Walmart, $X] yields exactly $X → Groceries.
    #[test]
    fn walmart_categorized_as_groceries() {
        let s = scenario();
        let results: Vec<_> = s.space.query(&walmart_pattern()).expect("query").collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get("$X"), Some(s.groceries));
        assert_eq!(results[0].len(), 1);
    }

    /// T2.2: A truth threshold on the matched link filters it.
    #[test]
    fn truth_threshold_on_link() {
        let s = scenario();
        let strong = walmart_pattern().constraint(Constraint::truth_at_least(Target::clause(0), 0.8, 0.5));
        assert_eq!(s.space.query(&strong).expect("query").count(), 1);
        let stricter = walmart_pattern().constraint(Constraint::truth_at_least(Target::clause(0), 0.9, 0.5));
        assert_eq!(s.space.query(&stricter).expect("query").count(), 0);
    }

    /// T2.3: A ground atom that is not stored gives an empty result.
    #[test]
    fn missing_ground_atom_empty() {
        let s = scenario();
        let pattern = Pattern::new().clause(PatternTerm::link(
            "Categorization",
            vec![PatternTerm::node("Concept", "Costco"), PatternTerm::var("$X")],
        ));
        assert_eq!(s.space.query(&pattern).expect("query").count(), 0);
    }

    /// T2.4: A pattern with no clauses has no solutions.
    #[test]
    fn zero_clauses_empty() {
        let s = scenario();
        assert_eq!(s.space.query(&Pattern::new()).expect("query").count(), 0);
    }

    /// T2.5: Constraints on variables no clause binds fail at compile time.
    #[test]
    fn unbound_constraint_variable() {
        let s = scenario();
        let pattern = walmart_pattern().constraint(Constraint::distinct("$X", "$Y"));
        assert!(matches!(
            s.space.query(&pattern),
            Err(AtomSpaceError::UnboundVariable(name)) if name == "$Y"
        ));
    }

    /// T2.6: Each enumeration is a fresh search.
    #[test]
    fn enumeration_repeatable() {
        let s = scenario();
        let first: Vec<_> = s.space.query(&walmart_pattern()).expect("query").collect();
        let second: Vec<_> = s.space.query(&walmart_pattern()).expect("query").collect();
        assert_eq!(first, second);
    }
}

// =============================================================================
// TIER T3: MULTI-CLAUSE MATCHING
// =============================================================================

mod t3_multi_clause {
    use super::*;

    fn with_hierarchy() -> (Scenario, Handle) {
        let s = scenario();
        s.space.register_type("Inheritance", Some("Link")).expect("inh");
        let food = s.space.add_node("Concept", "Food").expect("food");
        s.space
            .add_link("Inheritance", &[s.groceries, food])
            .expect("inheritance");
        (s, food)
    }

    /// T3.1: Shared variables join clauses.
    #[test]
    fn two_hop_join() {
        let (s, food) = with_hierarchy();
        let pattern = walmart_pattern().clause(PatternTerm::link(
            "Inheritance",
            vec![PatternTerm::var("$X"), PatternTerm::var("$P")],
        ));
        let results: Vec<_> = s.space.query(&pattern).expect("query").collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get("$X"), Some(s.groceries));
        assert_eq!(results[0].get("$P"), Some(food));
    }

    /// T3.2: Limits cap the number of results.
    #[test]
    fn max_results_cap() {
        let (s, _) = with_hierarchy();
        let query = Query::new(Pattern::new().clause(PatternTerm::typed_var("$N", "Concept")))
            .with_max_results(2);
        let mut matches = s.space.run(&query).expect("run");
        assert_eq!(matches.by_ref().count(), 2);
        assert!(!matches.budget_exhausted());
    }

    /// T3.3: Cycles in the data do not stall the search.
    #[test]
    fn cyclic_data_terminates() {
        let (s, food) = with_hierarchy();
        s.space
            .add_link("Inheritance", &[food, s.groceries])
            .expect("back edge");
        let pattern = Pattern::new()
            .clause(PatternTerm::link(
                "Inheritance",
                vec![PatternTerm::var("$A"), PatternTerm::var("$B")],
            ))
            .clause(PatternTerm::link(
                "Inheritance",
                vec![PatternTerm::var("$B"), PatternTerm::var("$A")],
            ));
        assert_eq!(s.space.query(&pattern).expect("query").count(), 2);
    }
}
