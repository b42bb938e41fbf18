//! Publisher that reports through `tracing`.

use crucible_core::{ExperimentResult, Publisher};
use tracing::{info, warn};

/// Logs every result: matches at `info`, mismatches at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

impl TracingPublisher {
    /// Creates a tracing publisher.
    pub const fn new() -> Self {
        Self
    }
}

impl<T, E, U> Publisher<T, E, U> for TracingPublisher {
    fn publish(&mut self, result: &ExperimentResult<T, E, U>) {
        let control = result.control();
        let candidate = result.candidate();

        if result.matched() {
            info!(
                "Experiment '{}' matched ({}): control {:?}, candidate {:?}",
                result.name(),
                result.order(),
                control.duration(),
                candidate.duration()
            );
        } else {
            warn!(
                "Experiment '{}' mismatched ({}): control ok={} in {:?}, candidate ok={} in {:?}",
                result.name(),
                result.order(),
                control.is_ok(),
                control.duration(),
                candidate.is_ok(),
                candidate.duration()
            );
        }
    }
}
