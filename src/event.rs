use indexmap::IndexMap;
use serde::Serialize;

/// One structured record extracted from a log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Seconds since the start of the log, as recorded by the testing tool.
    /// Not assumed monotonic: out-of-order values are kept in file order so
    /// that logging anomalies stay visible downstream.
    pub timestamp: f64,
    /// Channel label, e.g. `EXP`, `DATA`, `WARNING`.
    pub category: String,
    /// Free-form message text, preserved verbatim.
    pub payload: String,
    /// `key = value` pairs pulled out of the payload, in first-seen order.
    pub fields: IndexMap<String, String>,
}

/// Classification of one raw log line. Each line is classified exactly once;
/// there is no second look at a line once it has a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum LineRecord {
    /// A well-formed event line.
    Parsed(Event),
    /// Blank line, or a banner/header line without the three-field shape.
    Skipped,
    /// Has the three-field shape but the timestamp is not a number.
    Malformed,
}

/// Experiment date and time recovered from a log filename such as
/// `P01_task_2021-07-16_09h56.52.759.log.gz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS.mmm`
    pub time: String,
}

/// The fully parsed contents of one log file, in source order.
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub events: Vec<Event>,
    /// Lines that looked like events but carried an unparsable timestamp.
    /// Non-zero is a quality signal, not a failure.
    pub malformed_lines: usize,
    /// Session stamp from the source filename, when the pattern matched.
    pub session: Option<SessionStamp>,
}
