//! # Store Metrics
//!
//! Point-in-time counters computed from an atom table.

use crate::store::{AtomTable, HypergraphStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary counts over the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetrics {
    /// Total number of atoms.
    pub atom_count: usize,
    pub node_count: usize,
    pub link_count: usize,
    /// Registered types, built-ins included.
    pub type_count: usize,
    /// Atoms carrying a known truth value.
    pub annotated_count: usize,
    /// Largest outgoing set among stored links.
    pub max_arity: usize,
    /// Links per atom as fixed-point: `link_count * 1_000_000 / atom_count`.
    pub link_density_millionths: u64,
    /// Atom counts by exact type name. Types with no atoms are omitted.
    pub per_type: BTreeMap<String, usize>,
}

impl StoreMetrics {
    /// Create new metrics with all zeros.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute metrics from a table.
    #[must_use]
    pub fn from_table(table: &AtomTable) -> Self {
        let mut metrics = Self {
            type_count: table.types().len(),
            ..Self::default()
        };

        for (handle, key) in table.iter() {
            metrics.atom_count += 1;
            if key.is_link() {
                metrics.link_count += 1;
                metrics.max_arity = metrics.max_arity.max(key.outgoing().len());
            } else {
                metrics.node_count += 1;
            }
            if table.truth_value(handle).is_some() {
                metrics.annotated_count += 1;
            }
            let name = table.type_name(key.type_id).unwrap_or("?");
            *metrics.per_type.entry(name.to_string()).or_default() += 1;
        }

        metrics.link_density_millionths = if metrics.atom_count > 0 {
            (metrics.link_count as u64).saturating_mul(1_000_000) / metrics.atom_count as u64
        } else {
            0
        };

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truth::TruthValue;

    #[test]
    fn empty_table_metrics() {
        let metrics = StoreMetrics::from_table(&AtomTable::new());
        assert_eq!(metrics.atom_count, 0);
        assert_eq!(metrics.type_count, 4);
        assert_eq!(metrics.link_density_millionths, 0);
        assert!(metrics.per_type.is_empty());
    }

    #[test]
    fn counts_nodes_links_and_annotations() {
        let mut table = AtomTable::new();
        table.register_type("Concept", Some("Node")).expect("concept");
        table.register_type("Member", Some("Link")).expect("member");
        let a = table.add_node("Concept", "a").expect("a");
        let b = table.add_node("Concept", "b").expect("b");
        let l = table.add_link("Member", &[a, b, a]).expect("l");
        table
            .revise_truth(l, TruthValue::new(1.0, 0.5).expect("tv"))
            .expect("truth");

        let metrics = StoreMetrics::from_table(&table);
        assert_eq!(metrics.atom_count, 3);
        assert_eq!(metrics.node_count, 2);
        assert_eq!(metrics.link_count, 1);
        assert_eq!(metrics.annotated_count, 1);
        assert_eq!(metrics.max_arity, 3);
        assert_eq!(metrics.link_density_millionths, 333_333);
        assert_eq!(metrics.per_type.get("Concept"), Some(&2));
        assert_eq!(metrics.per_type.get("Member"), Some(&1));
    }
}
