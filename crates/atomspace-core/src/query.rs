//! # Query Module
//!
//! A pattern plus the caller's search caps.
//!
//! The engine has no timeouts of its own. Callers bound work with
//! `max_results` (stop after that many solutions) and `max_steps` (stop after
//! that many candidate atoms have been tried).

use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};

/// Caller-imposed caps on one query execution. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    pub max_results: Option<usize>,
    pub max_steps: Option<usize>,
}

/// A structured query.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub pattern: Pattern,
    pub limits: QueryLimits,
}

impl Query {
    /// Create a query with no caps.
    #[must_use]
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            limits: QueryLimits::default(),
        }
    }

    /// Stop after `max` solutions.
    #[must_use]
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.limits.max_results = Some(max);
        self
    }

    /// Stop after `max` candidates have been tried.
    #[must_use]
    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.limits.max_steps = Some(max);
        self
    }

    /// Replace both caps.
    #[must_use]
    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl From<Pattern> for Query {
    fn from(pattern: Pattern) -> Self {
        Self::new(pattern)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternTerm;

    #[test]
    fn query_creation() {
        let q = Query::new(Pattern::new().clause(PatternTerm::var("$X")));
        assert_eq!(q.limits, QueryLimits::default());
        assert_eq!(q.pattern.clauses().len(), 1);
    }

    #[test]
    fn query_with_limits() {
        let q = Query::new(Pattern::new())
            .with_max_results(10)
            .with_max_steps(1000);
        assert_eq!(q.limits.max_results, Some(10));
        assert_eq!(q.limits.max_steps, Some(1000));
    }

    #[test]
    fn limits_deserialize_with_defaults() {
        let limits: QueryLimits = serde_json::from_str(r#"{"max_results": 5}"#).expect("json");
        assert_eq!(limits.max_results, Some(5));
        assert_eq!(limits.max_steps, None);
    }
}
