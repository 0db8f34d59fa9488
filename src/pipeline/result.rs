//! Batch transformation results.

use crate::{Error, Result};

/// Outcome of transforming one unit.
#[derive(Debug)]
pub enum UnitOutcome {
    /// The unit was a target and has been rewritten
    Rewritten(Vec<u8>),
    /// The unit is not a target and must be passed on unchanged
    Skipped,
    /// The unit was a target but could not be transformed
    Failed(Error),
}

impl From<Result<Option<Vec<u8>>>> for UnitOutcome {
    fn from(result: Result<Option<Vec<u8>>>) -> Self {
        match result {
            Ok(Some(bytes)) => UnitOutcome::Rewritten(bytes),
            Ok(None) => UnitOutcome::Skipped,
            Err(e) => UnitOutcome::Failed(e),
        }
    }
}

/// Result of [`crate::pipeline::RemapTransformer::transform_all`].
///
/// Holds one outcome per input unit, in input order, along with counters. A failed unit never
/// affects the others.
///
/// # Usage
///
/// ```rust
/// use crossmap::pipeline::{result::UnitOutcome, EnvironmentLoader, RemapTransformer, TargetSet};
///
/// let environment = EnvironmentLoader::new().build();
/// let transformer = RemapTransformer::new(environment, TargetSet::from_names(["a/B"]));
///
/// let report = transformer.transform_all(&[("a/B", vec![0u8; 4]), ("c/D", vec![])]);
/// assert_eq!(report.failure_count(), 1);
/// assert_eq!(report.skipped_count(), 1);
/// assert!(matches!(report.outcome("c/D"), Some(UnitOutcome::Skipped)));
/// ```
#[derive(Debug, Default)]
pub struct TransformReport {
    /// Per-unit outcomes, in input order
    pub outcomes: Vec<(String, UnitOutcome)>,
    /// Number of rewritten units
    pub rewritten_count: usize,
    /// Number of units that were not targets
    pub skipped_count: usize,
    /// Number of units that failed
    pub failed_count: usize,
}

impl TransformReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for one unit.
    pub(crate) fn record(&mut self, name: String, outcome: UnitOutcome) {
        match &outcome {
            UnitOutcome::Rewritten(_) => self.rewritten_count += 1,
            UnitOutcome::Skipped => self.skipped_count += 1,
            UnitOutcome::Failed(_) => self.failed_count += 1,
        }
        self.outcomes.push((name, outcome));
    }

    /// Check if no unit failed.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed_count == 0
    }

    /// Check if any unit failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }

    /// Get the number of rewritten units.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.rewritten_count
    }

    /// Get the number of failed units.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed_count
    }

    /// Get the number of skipped (non-target) units.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped_count
    }

    /// The outcome recorded for `name`.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&UnitOutcome> {
        self.outcomes
            .iter()
            .find(|(unit, _)| unit == name)
            .map(|(_, outcome)| outcome)
    }

    /// Iterate over the failed units and their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
            UnitOutcome::Failed(e) => Some((name.as_str(), e)),
            _ => None,
        })
    }

    /// Iterate over the rewritten units and their new bytes.
    pub fn rewritten(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
            UnitOutcome::Rewritten(bytes) => Some((name.as_str(), bytes.as_slice())),
            _ => None,
        })
    }
}
