//! Timed invocation of a single trial.
//!
//! A trial runs one computation, records when it started and how long it
//! took, and captures whatever went wrong. Nothing escapes this layer: an
//! `Err` is kept as [`Failure::Error`] and a panic as [`Failure::Panic`], so
//! a failing candidate can never stop the control's outcome from being
//! produced, and vice versa.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Payload of a panic captured during a trial.
pub struct PanicPayload(Box<dyn Any + Send + 'static>);

impl PanicPayload {
    /// Wraps a payload returned by `catch_unwind`.
    pub fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self(payload)
    }

    /// Returns the panic message when the payload is a string.
    pub fn message(&self) -> Option<&str> {
        self.0
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.0.downcast_ref::<String>().map(String::as_str))
    }

    /// Unwraps the original payload, e.g. for `resume_unwind`.
    pub fn into_inner(self) -> Box<dyn Any + Send + 'static> {
        self.0
    }
}

impl fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.debug_tuple("PanicPayload").field(&message).finish(),
            None => f.write_str("PanicPayload(<non-string payload>)"),
        }
    }
}

impl From<String> for PanicPayload {
    fn from(message: String) -> Self {
        Self(Box::new(message))
    }
}

/// Why a trial produced no value.
#[derive(Debug)]
pub enum Failure<E> {
    /// The computation returned an error.
    Error(E),
    /// The computation panicked.
    Panic(PanicPayload),
}

impl<E> Failure<E> {
    /// Returns the error, if the computation returned one.
    pub const fn as_error(&self) -> Option<&E> {
        match self {
            Self::Error(e) => Some(e),
            Self::Panic(_) => None,
        }
    }

    /// Returns true if the computation panicked.
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => write!(f, "{e}"),
            Self::Panic(payload) => match payload.message() {
                Some(message) => write!(f, "panicked: {message}"),
                None => f.write_str("panicked"),
            },
        }
    }
}

/// Outcome of one timed trial.
#[derive(Debug)]
pub struct TrialOutcome<R, E> {
    outcome: Result<R, Failure<E>>,
    started_at: DateTime<Utc>,
    duration: Duration,
}

impl<R, E> TrialOutcome<R, E> {
    /// Creates an outcome from its parts.
    ///
    /// Trials normally come from [`observe`]; this exists for publishers
    /// and their tests.
    pub const fn new(
        outcome: Result<R, Failure<E>>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            outcome,
            started_at,
            duration,
        }
    }

    /// The value produced, if the trial succeeded.
    pub const fn result(&self) -> Option<&R> {
        match &self.outcome {
            Ok(value) => Some(value),
            Err(_) => None,
        }
    }

    /// The captured failure, if the trial failed.
    pub const fn failure(&self) -> Option<&Failure<E>> {
        match &self.outcome {
            Ok(_) => None,
            Err(failure) => Some(failure),
        }
    }

    /// The returned error, if the trial failed with one (not a panic).
    pub fn error(&self) -> Option<&E> {
        self.failure().and_then(Failure::as_error)
    }

    /// Returns true if the trial produced a value.
    pub const fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// When the trial started (UTC).
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock run time.
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Borrows the captured outcome.
    pub const fn outcome(&self) -> &Result<R, Failure<E>> {
        &self.outcome
    }

    /// Consumes the trial, returning the captured outcome.
    pub fn into_outcome(self) -> Result<R, Failure<E>> {
        self.outcome
    }
}

/// Runs `f` on the current thread, timing it and capturing any failure.
pub fn observe<R, E, F>(f: F) -> TrialOutcome<R, E>
where
    F: FnOnce() -> Result<R, E>,
{
    let started_at = Utc::now();
    let timer = Instant::now();

    let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Failure::Error(e)),
        Err(payload) => Err(Failure::Panic(PanicPayload::new(payload))),
    };

    TrialOutcome {
        outcome,
        started_at,
        duration: timer.elapsed(),
    }
}

/// Runs `f` on tokio's blocking pool, timing it and capturing any failure.
///
/// If the blocking task is lost (the runtime shut down underneath it), the
/// loss is recorded as a panic rather than propagated.
pub async fn observe_blocking<R, E, F>(f: F) -> TrialOutcome<R, E>
where
    F: FnOnce() -> Result<R, E> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    let started_at = Utc::now();
    let timer = Instant::now();

    match tokio::task::spawn_blocking(move || observe(f)).await {
        Ok(trial) => trial,
        Err(join_error) => {
            let payload = if join_error.is_panic() {
                PanicPayload::new(join_error.into_panic())
            } else {
                PanicPayload::from(format!("trial task did not complete: {join_error}"))
            };
            TrialOutcome {
                outcome: Err(Failure::Panic(payload)),
                started_at,
                duration: timer.elapsed(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_captures_value() {
        let trial = observe(|| Ok::<_, String>(42));
        assert_eq!(trial.result(), Some(&42));
        assert!(trial.failure().is_none());
        assert!(trial.is_ok());
    }

    #[test]
    fn observe_captures_error() {
        let trial = observe(|| Err::<i32, _>("boom".to_string()));
        assert!(trial.result().is_none());
        assert_eq!(trial.error(), Some(&"boom".to_string()));
    }

    #[test]
    fn observe_captures_panic() {
        let trial: TrialOutcome<i32, String> = observe(|| panic!("candidate blew up"));
        let failure = trial.failure().expect("panic should be captured");
        assert!(failure.is_panic());
        assert_eq!(failure.to_string(), "panicked: candidate blew up");
    }

    #[test]
    fn observe_measures_duration() {
        let trial = observe(|| {
            std::thread::sleep(Duration::from_millis(20));
            Ok::<_, String>(())
        });
        assert!(trial.duration() >= Duration::from_millis(20));
        assert!(trial.started_at() <= Utc::now());
    }

    #[test]
    fn panic_payload_message_handles_owned_strings() {
        let payload = PanicPayload::from("owned".to_string());
        assert_eq!(payload.message(), Some("owned"));
        assert_eq!(format!("{payload:?}"), "PanicPayload(\"owned\")");
    }

    #[test]
    fn panic_payload_without_string() {
        let payload = PanicPayload::new(Box::new(7_u32));
        assert!(payload.message().is_none());
    }

    #[tokio::test]
    async fn observe_blocking_captures_value_and_panic() {
        let ok = observe_blocking(|| Ok::<_, String>("done")).await;
        assert_eq!(ok.result(), Some(&"done"));

        let failed: TrialOutcome<(), String> = observe_blocking(|| panic!("async boom")).await;
        assert_eq!(
            failed.failure().and_then(|f| match f {
                Failure::Panic(p) => p.message().map(str::to_string),
                Failure::Error(_) => None,
            }),
            Some("async boom".to_string())
        );
    }
}
