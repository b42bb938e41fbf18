//! In-memory publisher for tests and embedding.

use crate::record::Record;
use crucible_core::{ExperimentResult, Publisher};
use std::fmt::{Debug, Display};
use std::sync::{Arc, Mutex, PoisonError};

/// Collects [`Record`]s in memory.
///
/// Clones share the same buffer, so one clone can be handed to an
/// experiment and another kept to inspect what was published.
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemoryPublisher {
    /// Creates an empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything published so far.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Returns only the mismatching records.
    pub fn mismatches(&self) -> Vec<Record> {
        self.lock()
            .iter()
            .filter(|record| !record.matched)
            .cloned()
            .collect()
    }

    /// Number of published records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing was published.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, E, U> Publisher<T, E, U> for MemoryPublisher
where
    T: Debug,
    E: Display,
    U: Debug,
{
    fn publish(&mut self, result: &ExperimentResult<T, E, U>) {
        self.lock().push(Record::from_result(result));
    }
}
