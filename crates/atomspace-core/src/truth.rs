//! # Truth Values
//!
//! Probabilistic annotation attached to atoms.
//!
//! - A truth value is a `(strength, confidence)` pair, both in `[0, 1]`
//! - Absence of a truth value means "unknown"
//! - Revision merges a new observation into an existing value with a
//!   confidence-weighted average; confidence never decreases
//!
//! Each stored atom owns a [`TruthCell`]. Updates lock only that cell, never
//! the store's mutation lock.

use crate::AtomSpaceError;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// A `(strength, confidence)` pair.
///
/// Deserialization goes through [`TruthValue::new`], so out-of-range input
/// is rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTruth")]
pub struct TruthValue {
    strength: f64,
    confidence: f64,
}

/// Unvalidated wire form of a [`TruthValue`].
#[derive(Deserialize)]
struct RawTruth {
    strength: f64,
    confidence: f64,
}

impl TryFrom<RawTruth> for TruthValue {
    type Error = AtomSpaceError;

    fn try_from(raw: RawTruth) -> Result<Self, Self::Error> {
        Self::new(raw.strength, raw.confidence)
    }
}

impl TruthValue {
    /// Create a truth value, rejecting NaN and values outside `[0, 1]`.
    pub fn new(strength: f64, confidence: f64) -> Result<Self, AtomSpaceError> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(strength) || !in_range(confidence) {
            return Err(AtomSpaceError::InvalidTruthValue {
                strength,
                confidence,
            });
        }
        Ok(Self {
            strength,
            confidence,
        })
    }

    #[must_use]
    pub const fn strength(&self) -> f64 {
        self.strength
    }

    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Merge a new observation into this value.
    ///
    /// `s' = (s1·c1 + s2·c2) / (c1 + c2)` and `c' = c1 + c2·(1 − c1)`.
    /// When both confidences are zero there is no evidence to weight, so the
    /// observation's strength is taken as is.
    #[must_use]
    pub fn revise(self, observation: TruthValue) -> TruthValue {
        let (s1, c1) = (self.strength, self.confidence);
        let (s2, c2) = (observation.strength, observation.confidence);

        let total = c1 + c2;
        let strength = if total > 0.0 {
            (s1 * c1 + s2 * c2) / total
        } else {
            s2
        };
        let confidence = c1 + c2 * (1.0 - c1);

        TruthValue {
            strength: strength.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// True if both components reach the given minimums.
    #[must_use]
    pub fn meets(&self, min_strength: f64, min_confidence: f64) -> bool {
        self.strength >= min_strength && self.confidence >= min_confidence
    }
}

// =============================================================================
// PER-ATOM CELL
// =============================================================================

/// Interior-mutable truth value slot owned by one stored atom.
#[derive(Debug, Default)]
pub struct TruthCell {
    value: Mutex<Option<TruthValue>>,
}

impl TruthCell {
    #[must_use]
    pub fn new(value: Option<TruthValue>) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Current value, `None` if unknown.
    #[must_use]
    pub fn get(&self) -> Option<TruthValue> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Revise the stored value with `observation` (or set it if unknown).
    /// Returns the resulting value.
    pub fn revise(&self, observation: TruthValue) -> TruthValue {
        let mut slot = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        let merged = match *slot {
            Some(current) => current.revise(observation),
            None => observation,
        };
        *slot = Some(merged);
        merged
    }

    /// Overwrite the stored value. Returns the previous one.
    pub fn replace(&self, value: Option<TruthValue>) -> Option<TruthValue> {
        let mut slot = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
