//! Error types for log loading, parsing and alignment.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::types::SeriesKey;

/// Failures that abort an analysis run.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The log path does not exist or could not be read.
    #[error("The file '{}' was not found or is unreadable", .path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A recognised record carried a token that is not a number (strict mode only).
    #[error("Malformed {record} record on line {line}: '{token}' is not a number")]
    MalformedRecord {
        line: usize,
        record: RecordKind,
        token: String,
    },

    /// Series lengths still disagree after down-sampling. Every required
    /// series is listed with its length, the reference series first.
    #[error("Mismatch in data lengths (reference length {reference_length}): {}", format_lengths(.lengths))]
    AlignmentMismatch {
        reference_length: usize,
        lengths: Vec<SeriesLength>,
    },

    /// Nothing after the time-loop marker produced a `Time = ` record.
    #[error("No iteration data found: the log has no 'Time = ' records after 'Starting time loop'")]
    NoIterationData,
}

/// Length of one series at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesLength {
    pub key: SeriesKey,
    pub length: usize,
}

impl fmt::Display for SeriesLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.length)
    }
}

fn format_lengths(lengths: &[SeriesLength]) -> String {
    lengths.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Kind of record a malformed token was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Time,
    Courant,
    Continuity,
    Residual,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Time => write!(f, "time"),
            RecordKind::Courant => write!(f, "Courant number"),
            RecordKind::Continuity => write!(f, "continuity error"),
            RecordKind::Residual => write!(f, "residual"),
        }
    }
}

/// A token the classifier matched structurally but could not convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedToken {
    pub record: RecordKind,
    pub token: String,
}
