//! Serializable snapshot of an experiment result.

use chrono::{DateTime, SecondsFormat, Utc};
use crucible_core::{ExecutionOrder, ExperimentResult, TrialOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Debug, Display};
use std::time::Duration;

/// One published experiment execution.
///
/// Values are rendered with `Debug` and failures with `Display`, so any
/// experiment can be recorded regardless of its value types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Experiment name.
    pub name: String,
    /// When the execution began.
    pub started_at: DateTime<Utc>,
    /// Whether the trials matched.
    pub matched: bool,
    /// Order the trials ran in.
    pub order: ExecutionOrder,
    /// The control trial.
    pub control: TrialRecord,
    /// The candidate trial.
    pub candidate: TrialRecord,
    /// Caller-supplied context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// One trial within a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Rendered value, if the trial succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Rendered failure, if the trial failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// When the trial started.
    pub started_at: DateTime<Utc>,
    /// Run time in microseconds.
    pub duration_us: u64,
}

impl Record {
    /// Snapshots an experiment result.
    pub fn from_result<T, E, U>(result: &ExperimentResult<T, E, U>) -> Self
    where
        T: Debug,
        E: Display,
        U: Debug,
    {
        Self {
            name: result.name().to_string(),
            started_at: result.started_at(),
            matched: result.matched(),
            order: result.order(),
            control: TrialRecord::from_trial(result.control()),
            candidate: TrialRecord::from_trial(result.candidate()),
            context: result.context().cloned(),
        }
    }

    /// Renders the record as one pipe-delimited line (without newline).
    ///
    /// Fields: started at, name, control value, control µs, candidate
    /// value, candidate µs, matched, context, control failure, candidate
    /// failure. Absent values are empty. Within a field `\`, `|`, newline
    /// and carriage return are escaped as `\\`, `\|`, `\n` and `\r`, so a
    /// record is always exactly one line of ten fields.
    pub fn to_line(&self) -> String {
        let context = self
            .context
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();

        [
            self.started_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.name.clone(),
            self.control.value.clone().unwrap_or_default(),
            self.control.duration_us.to_string(),
            self.candidate.value.clone().unwrap_or_default(),
            self.candidate.duration_us.to_string(),
            self.matched.to_string(),
            context,
            self.control.failure.clone().unwrap_or_default(),
            self.candidate.failure.clone().unwrap_or_default(),
        ]
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join("|")
    }
}

impl TrialRecord {
    /// Snapshots a single trial.
    pub fn from_trial<R: Debug, E: Display>(trial: &TrialOutcome<R, E>) -> Self {
        Self {
            value: trial.result().map(|value| format!("{value:?}")),
            failure: trial.failure().map(ToString::to_string),
            started_at: trial.started_at(),
            duration_us: micros(trial.duration()),
        }
    }
}

fn escape_field(field: &str) -> String {
    let mut escaped = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '|' => escaped.push_str("\\|"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use crucible_core::{ExecutionOrder, ExperimentResult, Failure, TrialOutcome};
    use std::time::Duration;

    pub fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    }

    /// A mismatching result with a failing candidate.
    pub fn checkout() -> ExperimentResult<bool, String> {
        ExperimentResult::new(
            "checkout".to_string(),
            base(),
            TrialOutcome::new(Ok(true), base(), Duration::from_micros(1500)),
            TrialOutcome::new(
                Err(Failure::Error("timeout".to_string())),
                base(),
                Duration::from_micros(2500),
            ),
            ExecutionOrder::CandidateFirst,
            Some(serde_json::json!({ "tenant": "acme" })),
            false,
        )
    }

    /// A mismatching result whose candidate error spans lines and holds a
    /// separator.
    pub fn multiline() -> ExperimentResult<i32, String> {
        ExperimentResult::new(
            "multiline".to_string(),
            base(),
            TrialOutcome::new(Ok(1), base(), Duration::from_micros(10)),
            TrialOutcome::new(
                Err(Failure::Error("first line\nsecond|field\\end\r".to_string())),
                base(),
                Duration::from_micros(20),
            ),
            ExecutionOrder::ControlFirst,
            None,
            false,
        )
    }

    /// Splits a rendered line back into unescaped fields.
    pub fn fields(line: &str) -> Vec<String> {
        let mut fields = vec![String::new()];
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('n') => fields.last_mut().unwrap().push('\n'),
                    Some('r') => fields.last_mut().unwrap().push('\r'),
                    Some(other) => fields.last_mut().unwrap().push(other),
                    None => panic!("dangling escape in {line:?}"),
                },
                '|' => fields.push(String::new()),
                c => fields.last_mut().unwrap().push(c),
            }
        }
        fields
    }

    /// A matching result without context.
    pub fn matching() -> ExperimentResult<i32, String> {
        ExperimentResult::new(
            "pricing".to_string(),
            base(),
            TrialOutcome::new(Ok(10), base(), Duration::from_micros(40)),
            TrialOutcome::new(Ok(10), base(), Duration::from_micros(55)),
            ExecutionOrder::Concurrent,
            None,
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn record_captures_values_and_failures() {
        let record = Record::from_result(&fixtures::checkout());

        assert_eq!(record.name, "checkout");
        assert!(!record.matched);
        assert_eq!(record.order, ExecutionOrder::CandidateFirst);
        assert_eq!(record.control.value.as_deref(), Some("true"));
        assert_eq!(record.control.failure, None);
        assert_eq!(record.candidate.value, None);
        assert_eq!(record.candidate.failure.as_deref(), Some("timeout"));
        assert_eq!(record.candidate.duration_us, 2500);
    }

    #[test]
    fn line_format_is_pipe_delimited() {
        let line = Record::from_result(&fixtures::checkout()).to_line();
        insta::assert_snapshot!(line, @r#"2024-01-15T09:00:00.000000Z|checkout|true|1500||2500|false|{"tenant":"acme"}||timeout"#);
    }

    #[test]
    fn line_leaves_missing_fields_empty() {
        let line = Record::from_result(&fixtures::matching()).to_line();
        assert_eq!(line, "2024-01-15T09:00:00.000000Z|pricing|10|40|10|55|true|||");
    }

    #[test]
    fn line_escapes_separators_and_newlines() {
        let line = Record::from_result(&fixtures::multiline()).to_line();

        assert_eq!(line.lines().count(), 1);
        assert!(line.ends_with(r"first line\nsecond\|field\\end\r"));

        let fields = fixtures::fields(&line);
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[1], "multiline");
        assert_eq!(fields[9], "first line\nsecond|field\\end\r");
    }

    #[test]
    fn line_escapes_context_and_values() {
        let mut record = Record::from_result(&fixtures::checkout());
        record.context = Some(serde_json::json!({ "note": "a|b" }));
        record.control.value = Some("\"x|y\"".to_string());

        let fields = fixtures::fields(&record.to_line());
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[2], "\"x|y\"");
        assert_eq!(fields[7], r#"{"note":"a|b"}"#);
    }

    #[test]
    fn record_json_omits_absent_fields() {
        let json = serde_json::to_value(Record::from_result(&fixtures::matching())).unwrap();
        assert_eq!(json["order"], "concurrent");
        assert!(json.get("context").is_none());
        assert!(json["control"].get("failure").is_none());
        assert_eq!(json["control"]["duration_us"], 40);
    }
}
