//! Deciding whether control and candidate matched.
//!
//! With no comparator registered, the default equality installed by
//! [`Experiment::new`](crate::Experiment::new) decides. Once any comparator is
//! registered, every layer must agree (logical AND); an empty layer is
//! vacuously satisfied.

use crate::trial::{Failure, TrialOutcome};
use std::time::Duration;

type OutcomeComparer<'a, T, E, U> =
    Box<dyn Fn(&TrialOutcome<T, E>, &TrialOutcome<U, E>) -> bool + Send + 'a>;
type ResultComparer<'a, T, U> = Box<dyn Fn(&T, &U) -> bool + Send + 'a>;
type FailureComparer<'a, E> =
    Box<dyn Fn(Option<&Failure<E>>, Option<&Failure<E>>) -> bool + Send + 'a>;
type DurationComparer<'a> = Box<dyn Fn(Duration, Duration) -> bool + Send + 'a>;

/// Layered comparison policy for one experiment.
pub(crate) struct Evaluator<'a, T, E, U> {
    default_eq: Option<fn(&T, &U) -> bool>,
    outcome: Vec<OutcomeComparer<'a, T, E, U>>,
    result: Vec<ResultComparer<'a, T, U>>,
    failure: Vec<FailureComparer<'a, E>>,
    duration: Vec<DurationComparer<'a>>,
}

impl<'a, T, E, U> Evaluator<'a, T, E, U> {
    pub(crate) const fn new(default_eq: Option<fn(&T, &U) -> bool>) -> Self {
        Self {
            default_eq,
            outcome: Vec::new(),
            result: Vec::new(),
            failure: Vec::new(),
            duration: Vec::new(),
        }
    }

    pub(crate) fn add_outcome<F>(&mut self, f: F)
    where
        F: Fn(&TrialOutcome<T, E>, &TrialOutcome<U, E>) -> bool + Send + 'a,
    {
        self.outcome.push(Box::new(f));
    }

    pub(crate) fn add_result<F>(&mut self, f: F)
    where
        F: Fn(&T, &U) -> bool + Send + 'a,
    {
        self.result.push(Box::new(f));
    }

    pub(crate) fn add_failure<F>(&mut self, f: F)
    where
        F: Fn(Option<&Failure<E>>, Option<&Failure<E>>) -> bool + Send + 'a,
    {
        self.failure.push(Box::new(f));
    }

    pub(crate) fn add_duration<F>(&mut self, f: F)
    where
        F: Fn(Duration, Duration) -> bool + Send + 'a,
    {
        self.duration.push(Box::new(f));
    }

    /// Number of registered comparator layers across all categories.
    pub(crate) fn layer_count(&self) -> usize {
        self.outcome.len() + self.result.len() + self.failure.len() + self.duration.len()
    }

    /// Returns true if a verdict can be reached at all.
    pub(crate) fn can_evaluate(&self) -> bool {
        self.default_eq.is_some() || self.layer_count() > 0
    }

    /// Evaluates the policy against a pair of trials.
    pub(crate) fn matches(&self, control: &TrialOutcome<T, E>, candidate: &TrialOutcome<U, E>) -> bool {
        if self.layer_count() == 0 {
            return self
                .default_eq
                .is_some_and(|eq| compare_results(control, candidate, eq));
        }

        self.outcome.iter().all(|f| f(control, candidate))
            && self
                .result
                .iter()
                .all(|f| compare_results(control, candidate, f))
            && self
                .failure
                .iter()
                .all(|f| f(control.failure(), candidate.failure()))
            && self
                .duration
                .iter()
                .all(|f| f(control.duration(), candidate.duration()))
    }
}

/// Applies a value comparison without ever touching a failed trial's value.
///
/// Both failed: nothing to compare, so they agree. One failed: they differ.
fn compare_results<T, E, U>(
    control: &TrialOutcome<T, E>,
    candidate: &TrialOutcome<U, E>,
    eq: impl Fn(&T, &U) -> bool,
) -> bool {
    match (control.result(), candidate.result()) {
        (Some(a), Some(b)) => eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
