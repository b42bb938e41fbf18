//! Fanning a completed result out to observers.

use crate::result::ExperimentResult;

/// An external collaborator that records experiment results.
///
/// File writers, metrics emitters and test spies implement this and are
/// registered with [`Experiment::publish_with`](crate::Experiment::publish_with).
/// Publishing has no error channel: an implementation that can fail must
/// handle (or log) its own errors.
pub trait Publisher<T, E, U = T>: Send {
    /// Records one result.
    fn publish(&mut self, result: &ExperimentResult<T, E, U>);
}

pub(crate) type Observer<'a, T, E, U> = Box<dyn FnMut(&ExperimentResult<T, E, U>) + Send + 'a>;

/// The three observer lists of an experiment.
pub(crate) struct Observers<'a, T, E, U> {
    pub(crate) all: Vec<Observer<'a, T, E, U>>,
    pub(crate) success: Vec<Observer<'a, T, E, U>>,
    pub(crate) failure: Vec<Observer<'a, T, E, U>>,
}

impl<T, E, U> Observers<'_, T, E, U> {
    pub(crate) const fn new() -> Self {
        Self {
            all: Vec::new(),
            success: Vec::new(),
            failure: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.all.len() + self.success.len() + self.failure.len()
    }

    /// Publishes `result` to every general observer, then to the success or
    /// failure observers depending on whether it matched.
    ///
    /// Dispatch owns the lists for the whole pass, so nothing an observer
    /// does can add to or remove from the set being iterated.
    pub(crate) fn dispatch(self, result: &ExperimentResult<T, E, U>) {
        let Self {
            mut all,
            mut success,
            mut failure,
        } = self;

        for observer in &mut all {
            observer(result);
        }

        let targeted = if result.matched() {
            &mut success
        } else {
            &mut failure
        };
        for observer in targeted {
            observer(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::ExecutionOrder;
    use crate::trial::TrialOutcome;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn result(matched: bool) -> ExperimentResult<i32, String> {
        ExperimentResult::new(
            "dispatch".to_string(),
            Utc::now(),
            TrialOutcome::new(Ok(1), Utc::now(), Duration::ZERO),
            TrialOutcome::new(Ok(if matched { 1 } else { 2 }), Utc::now(), Duration::ZERO),
            ExecutionOrder::ControlFirst,
            None,
            matched,
        )
    }

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Observer<'static, i32, String, i32> {
        let log = Arc::clone(log);
        Box::new(move |_| log.lock().unwrap().push(label))
    }

    fn observers(log: &Arc<Mutex<Vec<&'static str>>>) -> Observers<'static, i32, String, i32> {
        let mut observers = Observers::new();
        observers.all.push(recording(log, "all-1"));
        observers.all.push(recording(log, "all-2"));
        observers.success.push(recording(log, "success"));
        observers.failure.push(recording(log, "failure"));
        observers
    }

    #[test]
    fn matched_result_reaches_general_then_success() {
        let log = Arc::new(Mutex::new(Vec::new()));
        observers(&log).dispatch(&result(true));
        assert_eq!(*log.lock().unwrap(), vec!["all-1", "all-2", "success"]);
    }

    #[test]
    fn mismatched_result_reaches_general_then_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        observers(&log).dispatch(&result(false));
        assert_eq!(*log.lock().unwrap(), vec!["all-1", "all-2", "failure"]);
    }

    #[test]
    fn counts_every_list() {
        let log = Arc::new(Mutex::new(Vec::new()));
        assert_eq!(observers(&log).len(), 4);
    }
}
