//! Running an experiment and resolving what the caller sees.
//!
//! Both entry points share one contract: the control's outcome is what the
//! caller gets. A control error is returned unchanged as
//! [`Error::Control`], a control panic is resumed with its original
//! payload, and candidate failures are only ever published.

use crate::dispatch::Observers;
use crate::error::{ConfigError, Error};
use crate::evaluator::Evaluator;
use crate::experiment::{Computation, Experiment};
use crate::order::ExecutionOrder;
use crate::result::ExperimentResult;
use crate::trial::{self, Failure, TrialOutcome};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt::Debug;
use std::panic;
use tracing::{debug, warn};

/// What to do after preconditions and gates were checked.
enum Plan<'a, T, E, U> {
    /// A gate was closed: run the control alone.
    ControlOnly(Computation<'a, T, E>),
    /// Run both trials, then finish.
    Trials {
        control: Computation<'a, T, E>,
        candidate: Computation<'a, U, E>,
        finish: Finish<'a, T, E, U>,
    },
}

/// The parts of an experiment needed once both trials have run.
struct Finish<'a, T, E, U> {
    name: String,
    evaluator: Evaluator<'a, T, E, U>,
    observers: Observers<'a, T, E, U>,
    context: Option<Value>,
    raise_on_mismatch: bool,
}

impl<'a, T, E, U> Experiment<'a, T, E, U> {
    fn plan(mut self) -> Result<Plan<'a, T, E, U>, ConfigError> {
        let (Some(control), Some(candidate)) = (self.control.take(), self.candidate.take()) else {
            return Err(ConfigError::invalid_state(
                "test must be called before the experiment is executed",
            ));
        };

        if !self.evaluator.can_evaluate() {
            return Err(ConfigError::invalid_state(
                "values have no default equality; register a comparer",
            ));
        }

        if !self.predicates.iter_mut().all(|predicate| predicate()) {
            debug!("Experiment '{}' gated off, running control only", self.name);
            return Ok(Plan::ControlOnly(control));
        }

        Ok(Plan::Trials {
            control,
            candidate,
            finish: Finish {
                name: self.name,
                evaluator: self.evaluator,
                observers: self.observers,
                context: self.context,
                raise_on_mismatch: self.raise_on_mismatch,
            },
        })
    }
}

impl<'a, T, E, U> Experiment<'a, T, E, U>
where
    T: Debug,
    U: Debug,
    E: Debug,
{
    /// Runs control and candidate one after the other on this thread, in
    /// an order drawn from the configured [`RunOrder`](crate::RunOrder).
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `test` was never called, or no comparison is
    ///   possible.
    /// - [`Error::Control`] with the control's own error if it failed.
    /// - [`Error::Mismatch`] if the trials disagreed and
    ///   [`raise_on_mismatch`](Self::raise_on_mismatch) is set. Observers
    ///   have already been called by then.
    ///
    /// # Panics
    ///
    /// Resumes the control's panic, with its original payload, after the
    /// result has been published.
    pub fn execute(self) -> Result<T, Error<E>> {
        let order = self.order;

        match self.plan()? {
            Plan::ControlOnly(control) => control().map_err(Error::Control),
            Plan::Trials {
                control,
                candidate,
                finish,
            } => {
                let started_at = Utc::now();
                let order = order.decide();
                debug!("Running experiment '{}' ({})", finish.name, order);

                let (control, candidate) = if order.control_ran_first() {
                    let control = trial::observe(control);
                    (control, trial::observe(candidate))
                } else {
                    let candidate = trial::observe(candidate);
                    (trial::observe(control), candidate)
                };

                finish.finish(started_at, control, candidate, order)
            }
        }
    }
}

impl<T, E, U> Experiment<'static, T, E, U>
where
    T: Debug + Send + 'static,
    U: Debug + Send + 'static,
    E: Debug + Send + 'static,
{
    /// Runs control and candidate concurrently on tokio's blocking pool and
    /// waits for both.
    ///
    /// No order is imposed, so the result reports
    /// [`ExecutionOrder::Concurrent`]. Comparison and publishing happen
    /// after both trials finished, without further suspension.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    ///
    /// # Panics
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn execute_async(self) -> Result<T, Error<E>> {
        match self.plan()? {
            Plan::ControlOnly(control) => surface(trial::observe_blocking(control).await.into_outcome()),
            Plan::Trials {
                control,
                candidate,
                finish,
            } => {
                let started_at = Utc::now();
                debug!("Running experiment '{}' (concurrent)", finish.name);

                let (control, candidate) = tokio::join!(
                    trial::observe_blocking(control),
                    trial::observe_blocking(candidate)
                );

                finish.finish(started_at, control, candidate, ExecutionOrder::Concurrent)
            }
        }
    }
}

impl<T, E, U> Finish<'_, T, E, U>
where
    T: Debug,
    U: Debug,
    E: Debug,
{
    /// Evaluates, publishes, then resolves the caller's outcome.
    fn finish(
        self,
        started_at: DateTime<Utc>,
        control: TrialOutcome<T, E>,
        candidate: TrialOutcome<U, E>,
        order: ExecutionOrder,
    ) -> Result<T, Error<E>> {
        let matched = self.evaluator.matches(&control, &candidate);
        debug!(
            "Experiment '{}' finished: matched={}, control={:?}, candidate={:?}",
            self.name,
            matched,
            control.duration(),
            candidate.duration()
        );

        let result = ExperimentResult::new(
            self.name,
            started_at,
            control,
            candidate,
            order,
            self.context,
            matched,
        );
        self.observers.dispatch(&result);

        let name = result.name().to_string();
        let (control, candidate) = result.into_trials();
        let value = surface(control.into_outcome())?;

        if self.raise_on_mismatch && !matched {
            warn!("Experiment '{}' mismatched", name);
            return Err(Error::Mismatch {
                control: format!("{value:?}"),
                candidate: render(&candidate),
            });
        }

        Ok(value)
    }
}

/// Hands the control's outcome to the caller exactly as it happened.
fn surface<T, E>(outcome: Result<T, Failure<E>>) -> Result<T, Error<E>> {
    match outcome {
        Ok(value) => Ok(value),
        Err(Failure::Error(e)) => Err(Error::Control(e)),
        Err(Failure::Panic(payload)) => panic::resume_unwind(payload.into_inner()),
    }
}

fn render<R: Debug, E: Debug>(trial: &TrialOutcome<R, E>) -> String {
    match trial.outcome() {
        Ok(value) => format!("{value:?}"),
        Err(failure) => format!("{failure:?}"),
    }
}
