//! Experiment engine for Crucible.
//!
//! An experiment runs a trusted **control** and a new **candidate**, times
//! both, decides whether they matched, and publishes the result, while the
//! caller only ever observes the control's outcome. This makes it safe to
//! try a rewritten code path against production traffic.
//!
//! # Guarantees
//!
//! - **Transparency**: the caller gets the control's value, the control's
//!   own error, or the control's resumed panic. Candidate failures are
//!   recorded and published, never surfaced.
//! - **Fail fast**: misconfiguration (empty name, `test` called twice,
//!   executing before `test`) is reported before anything runs.
//! - **Publish before raise**: observers see every executed result,
//!   including the one that triggers a mismatch error.
//!
//! # Example
//!
//! ```rust
//! use crucible_core::Experiment;
//!
//! fn load_from_db(id: u32) -> Result<u32, String> { Ok(id) }
//! fn load_from_cache(id: u32) -> Result<u32, String> { Ok(id) }
//!
//! let id = 4;
//! let value = Experiment::new("cache-migration")?
//!     .test(move || load_from_db(id), move || load_from_cache(id))?
//!     .with_context(serde_json::json!({ "id": id }))
//!     .publish_failure_to(|result| {
//!         eprintln!("{} mismatched: {:?}", result.name(), result.candidate());
//!     })
//!     .execute()?;
//!
//! assert_eq!(value, 4);
//! # Ok::<(), crucible_core::Error<String>>(())
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod dispatch;
pub mod error;
mod evaluator;
mod execute;
pub mod experiment;
pub mod order;
pub mod result;
pub mod trial;

pub use dispatch::Publisher;
pub use error::{ConfigError, Error, Result};
pub use experiment::Experiment;
pub use order::{ExecutionOrder, RunOrder};
pub use result::ExperimentResult;
pub use trial::{Failure, PanicPayload, TrialOutcome};
