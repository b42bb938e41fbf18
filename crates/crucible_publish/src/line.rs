//! Pipe-delimited line publisher.

use crate::error::Result;
use crate::record::Record;
use crucible_core::{ExperimentResult, Publisher};
use std::fmt::{Debug, Display};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Writes one pipe-delimited line per execution.
///
/// See [`Record::to_line`] for the field order.
#[derive(Debug)]
pub struct LinePublisher<W> {
    writer: W,
}

impl LinePublisher<File> {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Appending experiment lines to {}", path.display());
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> LinePublisher<W> {
    /// Wraps a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one record as a line and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        writeln!(self.writer, "{}", record.to_line())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<T, E, U, W> Publisher<T, E, U> for LinePublisher<W>
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures;
    use std::fs;

    #[test]
    fn publishes_one_line_per_result() {
        let mut publisher = LinePublisher::new(Vec::new());
        publisher.publish(&fixtures::checkout());
        publisher.publish(&fixtures::matching());

        let output = String::from_utf8(publisher.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("|checkout|"));
        assert!(lines[1].contains("|pricing|"));
    }

    #[test]
    fn multiline_failure_stays_on_one_line() {
        let mut publisher = LinePublisher::new(Vec::new());
        let value = crucible_core::Experiment::new("escaped")
            .unwrap()
            .test(|| Ok(1_i32), || Err::<i32, _>("first line\nsecond|field".to_string()))
            .unwrap()
            .publish_to(|result| publisher.publish(result))
            .execute()
            .unwrap();
        assert_eq!(value, 1);

        let output = String::from_utf8(publisher.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 1);

        let fields = fixtures::fields(output.trim_end_matches('\n'));
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[8], "");
        assert_eq!(fields[9], "first line\nsecond|field");
    }

    #[test]
    fn append_keeps_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiments.log");

        for _ in 0..2 {
            let mut publisher = LinePublisher::append(&path).unwrap();
            publisher.publish(&fixtures::matching());
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn append_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = LinePublisher::append(dir.path().join("missing").join("out.log"));
        assert!(result.is_err());
    }
}
