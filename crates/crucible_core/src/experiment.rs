//! Fluent experiment configuration.

use crate::dispatch::{Observers, Publisher};
use crate::error::{ConfigError, Result};
use crate::evaluator::Evaluator;
use crate::order::RunOrder;
use crate::result::ExperimentResult;
use crate::trial::{Failure, TrialOutcome};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub(crate) type Computation<'a, R, E> = Box<dyn FnOnce() -> std::result::Result<R, E> + Send + 'a>;
type Predicate<'a> = Box<dyn FnMut() -> bool + Send + 'a>;

/// One configured comparison of a control against a candidate.
///
/// `T` is the control's value type, `U` the candidate's (the same by
/// default) and `E` the error type both computations share. `'a` bounds
/// what the registered closures may borrow; concurrent execution requires
/// `'static`.
///
/// Configure with the builder methods, then consume with
/// [`execute`](Self::execute) or [`execute_async`](Self::execute_async).
/// Consuming the experiment is the transition to the executed state: once
/// run, it cannot be reconfigured or run again.
///
/// # Example
///
/// ```rust
/// use crucible_core::Experiment;
///
/// let total = Experiment::new("sum-refactor")?
///     .test(|| Ok::<_, String>((1..=10).sum::<i32>()), || Ok(55))?
///     .publish_to(|result| assert!(result.matched()))
///     .execute()?;
///
/// assert_eq!(total, 55);
/// # Ok::<(), crucible_core::Error<String>>(())
/// ```
pub struct Experiment<'a, T, E, U = T> {
    pub(crate) name: String,
    pub(crate) control: Option<Computation<'a, T, E>>,
    pub(crate) candidate: Option<Computation<'a, U, E>>,
    pub(crate) evaluator: Evaluator<'a, T, E, U>,
    pub(crate) predicates: Vec<Predicate<'a>>,
    pub(crate) observers: Observers<'a, T, E, U>,
    pub(crate) context: Option<Value>,
    pub(crate) raise_on_mismatch: bool,
    pub(crate) order: RunOrder,
}

impl<'a, T, E, U> Experiment<'a, T, E, U>
where
    T: PartialEq<U>,
{
    /// Creates an experiment compared by `==` unless comparers are added.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`] if `name` is empty or only
    /// whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::build(name.into(), Some(|control: &T, candidate: &U| control == candidate))
    }
}

impl<'a, T, E, U> Experiment<'a, T, E, U> {
    /// Creates an experiment for value types that cannot be compared with
    /// `==`.
    ///
    /// At least one comparer must be registered before execution.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`] if `name` is empty or only
    /// whitespace.
    pub fn without_default(name: impl Into<String>) -> Result<Self> {
        Self::build(name.into(), None)
    }

    fn build(name: String, default_eq: Option<fn(&T, &U) -> bool>) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(ConfigError::invalid_argument(
                "name",
                "experiment name must not be empty",
            ));
        }

        Ok(Self {
            name,
            control: None,
            candidate: None,
            evaluator: Evaluator::new(default_eq),
            predicates: Vec::new(),
            observers: Observers::new(),
            context: None,
            raise_on_mismatch: false,
            order: RunOrder::default(),
        })
    }

    /// Sets the control and the candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidState`] if they were already set.
    pub fn test<C, D>(mut self, control: C, candidate: D) -> Result<Self>
    where
        C: FnOnce() -> std::result::Result<T, E> + Send + 'a,
        D: FnOnce() -> std::result::Result<U, E> + Send + 'a,
    {
        if self.control.is_some() || self.candidate.is_some() {
            return Err(ConfigError::invalid_state(
                "test may not be called multiple times",
            ));
        }

        self.control = Some(Box::new(control));
        self.candidate = Some(Box::new(candidate));
        Ok(self)
    }

    /// Adds a comparer over the two complete trials.
    #[must_use]
    pub fn with_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&TrialOutcome<T, E>, &TrialOutcome<U, E>) -> bool + Send + 'a,
    {
        self.evaluator.add_outcome(comparer);
        self
    }

    /// Adds a comparer over the two values.
    ///
    /// Applies when both trials produced a value. If exactly one failed the
    /// layer fails; if both failed it is satisfied.
    #[must_use]
    pub fn with_result_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&T, &U) -> bool + Send + 'a,
    {
        self.evaluator.add_result(comparer);
        self
    }

    /// Adds a comparer over the two failures (`None` for a trial that
    /// succeeded).
    #[must_use]
    pub fn with_failure_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(Option<&Failure<E>>, Option<&Failure<E>>) -> bool + Send + 'a,
    {
        self.evaluator.add_failure(comparer);
        self
    }

    /// Adds a comparer over the two run times (control, candidate).
    #[must_use]
    pub fn with_duration_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(Duration, Duration) -> bool + Send + 'a,
    {
        self.evaluator.add_duration(comparer);
        self
    }

    /// Adds a gate. The experiment runs only if every gate returns true;
    /// otherwise the control runs alone and nothing is published.
    #[must_use]
    pub fn where_<P>(mut self, predicate: P) -> Self
    where
        P: FnMut() -> bool + Send + 'a,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Publishes every result to `observer`.
    #[must_use]
    pub fn publish_to<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&ExperimentResult<T, E, U>) + Send + 'a,
    {
        self.observers.all.push(Box::new(observer));
        self
    }

    /// Publishes matching results to `observer`.
    #[must_use]
    pub fn publish_success_to<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&ExperimentResult<T, E, U>) + Send + 'a,
    {
        self.observers.success.push(Box::new(observer));
        self
    }

    /// Publishes mismatching results to `observer`.
    #[must_use]
    pub fn publish_failure_to<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&ExperimentResult<T, E, U>) + Send + 'a,
    {
        self.observers.failure.push(Box::new(observer));
        self
    }

    /// Publishes every result to a [`Publisher`].
    #[must_use]
    pub fn publish_with<P>(self, mut publisher: P) -> Self
    where
        P: Publisher<T, E, U> + 'a,
    {
        self.publish_to(move |result| publisher.publish(result))
    }

    /// Attaches an opaque context to every published result.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<Value>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Makes execution fail with [`Error::Mismatch`](crate::Error::Mismatch)
    /// when the trials disagree.
    #[must_use]
    pub const fn raise_on_mismatch(mut self) -> Self {
        self.raise_on_mismatch = true;
        self
    }

    /// Sets how the sequential run order is chosen.
    #[must_use]
    pub const fn with_order(mut self, order: RunOrder) -> Self {
        self.order = order;
        self
    }

    /// Uses a seeded coin for the sequential run order.
    #[must_use]
    pub const fn with_seed(self, seed: u64) -> Self {
        self.with_order(RunOrder::Seeded(seed))
    }

    /// Name of the experiment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once `test` has been called.
    pub const fn is_ready(&self) -> bool {
        self.control.is_some() && self.candidate.is_some()
    }
}

impl<T, E, U> fmt::Debug for Experiment<'_, T, E, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("name", &self.name)
            .field("ready", &self.is_ready())
            .field("comparers", &self.evaluator.layer_count())
            .field("predicates", &self.predicates.len())
            .field("observers", &self.observers.len())
            .field("context", &self.context)
            .field("raise_on_mismatch", &self.raise_on_mismatch)
            .field("order", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Bool = Experiment<'static, bool, String>;

    #[test]
    fn new_rejects_empty_name() {
        assert!(matches!(
            Bool::new(""),
            Err(ConfigError::InvalidArgument { argument: "name", .. })
        ));
    }

    #[test]
    fn new_rejects_whitespace_name() {
        assert!(Bool::new("  \t\n").is_err());
        assert!(Bool::without_default(" ").is_err());
    }

    #[test]
    fn test_sets_both_paths() {
        let experiment = Bool::new("ready").unwrap();
        assert!(!experiment.is_ready());
        let experiment = experiment.test(|| Ok(true), || Ok(true)).unwrap();
        assert!(experiment.is_ready());
    }

    #[test]
    fn test_twice_is_invalid_state() {
        let experiment = Bool::new("twice")
            .unwrap()
            .test(|| Ok(true), || Ok(true))
            .unwrap();
        let err = experiment.test(|| Ok(true), || Ok(false)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidState(_)));
    }

    #[test]
    fn builder_accumulates_configuration() {
        let experiment = Bool::new("configured")
            .unwrap()
            .with_comparer(|a, b| a.is_ok() == b.is_ok())
            .with_result_comparer(|a, b| a == b)
            .where_(|| true)
            .where_(|| true)
            .publish_to(|_| {})
            .publish_success_to(|_| {})
            .publish_failure_to(|_| {})
            .with_context(serde_json::json!({ "user": 7 }))
            .raise_on_mismatch()
            .with_seed(9);

        assert_eq!(experiment.name(), "configured");
        assert_eq!(experiment.evaluator.layer_count(), 2);
        assert_eq!(experiment.predicates.len(), 2);
        assert_eq!(experiment.observers.len(), 3);
        assert_eq!(experiment.context, Some(serde_json::json!({ "user": 7 })));
        assert!(experiment.raise_on_mismatch);
        assert_eq!(experiment.order, RunOrder::Seeded(9));
    }

    #[test]
    fn debug_does_not_require_debug_values() {
        struct Opaque;
        let experiment: Experiment<'_, Opaque, ()> =
            Experiment::without_default("opaque").unwrap();
        let rendered = format!("{experiment:?}");
        assert!(rendered.contains("\"opaque\""));
        assert!(rendered.contains("ready: false"));
    }
}
