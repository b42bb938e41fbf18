//! The result of one experiment execution.

use crate::order::ExecutionOrder;
use crate::trial::TrialOutcome;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Everything observed during one execution of an experiment.
///
/// Built once per execution, handed to every observer by shared
/// reference, then consumed by the executor to resolve the caller's
/// return value.
#[derive(Debug)]
pub struct ExperimentResult<T, E, U = T> {
    name: String,
    started_at: DateTime<Utc>,
    control: TrialOutcome<T, E>,
    candidate: TrialOutcome<U, E>,
    order: ExecutionOrder,
    context: Option<Value>,
    matched: bool,
}

impl<T, E, U> ExperimentResult<T, E, U> {
    /// Assembles a result.
    ///
    /// The executor is the normal producer; this is public so publishers
    /// can be exercised without running an experiment.
    pub const fn new(
        name: String,
        started_at: DateTime<Utc>,
        control: TrialOutcome<T, E>,
        candidate: TrialOutcome<U, E>,
        order: ExecutionOrder,
        context: Option<Value>,
        matched: bool,
    ) -> Self {
        Self {
            name,
            started_at,
            control,
            candidate,
            order,
            context,
            matched,
        }
    }

    /// Name of the experiment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the execution began (UTC).
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The control trial.
    pub const fn control(&self) -> &TrialOutcome<T, E> {
        &self.control
    }

    /// The candidate trial.
    pub const fn candidate(&self) -> &TrialOutcome<U, E> {
        &self.candidate
    }

    /// The order the trials ran in.
    pub const fn order(&self) -> ExecutionOrder {
        self.order
    }

    /// Returns true if the control ran to completion before the candidate.
    pub const fn control_ran_first(&self) -> bool {
        self.order.control_ran_first()
    }

    /// The opaque context attached by the caller.
    pub const fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// Whether the trials matched under the configured comparison policy.
    pub const fn matched(&self) -> bool {
        self.matched
    }

    pub(crate) fn into_trials(self) -> (TrialOutcome<T, E>, TrialOutcome<U, E>) {
        (self.control, self.candidate)
    }
}
