//! JSON-lines publisher.

use crate::error::Result;
use crate::record::Record;
use crucible_core::{ExperimentResult, Publisher};
use std::fmt::{Debug, Display};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Writes one JSON [`Record`] per line.
#[derive(Debug)]
pub struct JsonLinesPublisher<W> {
    writer: W,
}

impl JsonLinesPublisher<File> {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Appending experiment records to {}", path.display());
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> JsonLinesPublisher<W> {
    /// Wraps a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one record as a JSON line and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<T, E, U, W> Publisher<T, E, U> for JsonLinesPublisher<W>
where
    T: Debug,
    E: Display,
    U: Debug,
    W: Write + Send,
{
    fn publish(&mut self, result: &ExperimentResult<T, E, U>) {
        if let Err(e) = self.write_record(&Record::from_result(result)) {
            warn!("Failed to publish experiment '{}': {}", result.name(), e);
        }
    }
}

/// Reads records back from JSON-lines content, skipping blank lines.
///
/// # Errors
///
/// Returns an error if a line is not a valid record.
pub fn parse_records(content: &str) -> Result<Vec<Record>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(Into::into))
        .collect()
}
