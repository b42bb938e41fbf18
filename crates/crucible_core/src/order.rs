//! Run-order selection.
//!
//! Sequential experiments flip a coin per execution to decide whether the
//! control or the candidate runs first. Alternating the order across many
//! executions surfaces bugs that depend on which path touched shared state
//! first. The coin is injectable so tests can force either order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of the run order for sequential execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOrder {
    /// Fair coin from the thread-local generator.
    #[default]
    Random,
    /// Fair coin with a fixed seed (reproducible).
    Seeded(u64),
    /// Always run the control first.
    ControlFirst,
    /// Always run the candidate first.
    CandidateFirst,
}

impl RunOrder {
    /// Decides the order for one sequential execution.
    pub fn decide(self) -> ExecutionOrder {
        let control_first = match self {
            Self::Random => rand::thread_rng().gen_bool(0.5),
            Self::Seeded(seed) => ChaCha8Rng::seed_from_u64(seed).gen_bool(0.5),
            Self::ControlFirst => true,
            Self::CandidateFirst => false,
        };

        if control_first {
            ExecutionOrder::ControlFirst
        } else {
            ExecutionOrder::CandidateFirst
        }
    }
}

/// The order in which the trials of one execution actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOrder {
    /// Control ran to completion, then the candidate.
    ControlFirst,
    /// Candidate ran to completion, then the control.
    CandidateFirst,
    /// Both ran concurrently; no order was imposed.
    Concurrent,
}

impl ExecutionOrder {
    /// Returns true only when the control demonstrably ran first.
    pub const fn control_ran_first(self) -> bool {
        matches!(self, Self::ControlFirst)
    }
}

impl std::fmt::Display for ExecutionOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ControlFirst => write!(f, "control-first"),
            Self::CandidateFirst => write!(f, "candidate-first"),
            Self::Concurrent => write!(f, "concurrent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_orders_are_honoured() {
        assert_eq!(RunOrder::ControlFirst.decide(), ExecutionOrder::ControlFirst);
        assert_eq!(RunOrder::CandidateFirst.decide(), ExecutionOrder::CandidateFirst);
    }

    #[test]
    fn seeded_order_is_reproducible() {
        for seed in 0..32 {
            assert_eq!(RunOrder::Seeded(seed).decide(), RunOrder::Seeded(seed).decide());
        }
    }

    #[test]
    fn seeds_cover_both_orders() {
        let orders: Vec<_> = (0..64).map(|seed| RunOrder::Seeded(seed).decide()).collect();
        assert!(orders.contains(&ExecutionOrder::ControlFirst));
        assert!(orders.contains(&ExecutionOrder::CandidateFirst));
    }

    #[test]
    fn random_order_eventually_covers_both() {
        let orders: Vec<_> = (0..200).map(|_| RunOrder::Random.decide()).collect();
        assert!(orders.contains(&ExecutionOrder::ControlFirst));
        assert!(orders.contains(&ExecutionOrder::CandidateFirst));
    }

    #[test]
    fn concurrent_is_not_control_first() {
        assert!(!ExecutionOrder::Concurrent.control_ran_first());
        assert!(ExecutionOrder::ControlFirst.control_ran_first());
        assert_eq!(ExecutionOrder::Concurrent.to_string(), "concurrent");
    }
}
