//! Error types for configuring and executing experiments.

use thiserror::Error;

/// Errors raised while an experiment is being configured.
///
/// These fail fast: a malformed experiment never gets to run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required argument was empty or otherwise unusable.
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The experiment is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl ConfigError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

/// Errors surfaced to the caller of `execute` or `execute_async`.
///
/// `E` is the error type shared by the control and candidate computations.
/// Only the control's error ever appears here; candidate failures are
/// recorded on the result and published, never returned.
#[derive(Debug, Error)]
pub enum Error<E> {
    /// The experiment was misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The control computation failed. Carries its error unchanged.
    #[error("{0}")]
    Control(E),

    /// Control and candidate disagreed and the experiment raises on mismatch.
    #[error("Control: {control}, Candidate: {candidate}")]
    Mismatch {
        /// Rendering of the control outcome.
        control: String,
        /// Rendering of the candidate outcome.
        candidate: String,
    },
}

impl<E> Error<E> {
    /// Returns the control's own error, if that is what this is.
    pub fn into_control(self) -> Option<E> {
        match self {
            Self::Control(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if this is a mismatch failure.
    pub const fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }

    /// Returns true if this is a configuration failure.
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for experiment configuration.
pub type Result<T> = std::result::Result<T, ConfigError>;
