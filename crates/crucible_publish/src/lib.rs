//! Publishers that record Crucible experiment results.
//!
//! The experiment engine only knows the [`Publisher`] trait; this crate
//! provides the usual destinations for results:
//!
//! - [`LinePublisher`]: pipe-delimited lines, one per execution
//! - [`JsonLinesPublisher`]: one JSON [`Record`] per line
//! - [`TracingPublisher`]: `tracing` events (info on match, warn on mismatch)
//! - [`MemoryPublisher`]: an in-memory recorder for tests
//!
//! # Example
//!
//! ```rust
//! use crucible_core::Experiment;
//! use crucible_publish::MemoryPublisher;
//!
//! let recorder = MemoryPublisher::new();
//! Experiment::new("recorded")?
//!     .test(|| Ok::<_, std::io::Error>(1), || Ok(2))?
//!     .publish_with(recorder.clone())
//!     .execute()?;
//!
//! assert_eq!(recorder.mismatches().len(), 1);
//! # Ok::<(), crucible_core::Error<std::io::Error>>(())
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod json;
pub mod line;
pub mod logging;
pub mod memory;
pub mod record;

pub use crucible_core::Publisher;
pub use error::{Error, Result};
pub use json::JsonLinesPublisher;
pub use line::LinePublisher;
pub use logging::TracingPublisher;
pub use memory::MemoryPublisher;
pub use record::{Record, TrialRecord};
