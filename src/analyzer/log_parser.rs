//! Single forward pass over a solver log building one sequence per quantity.

use super::error::AnalyzerError;
use super::line_classifier::classify_line;
use super::types::{FieldSet, LineRecord, RawSeriesMap, SeriesKey, SimulationMode};

/// Line that separates solver setup output from the time loop.
pub const LOOP_START_MARKER: &str = "Starting time loop";

/// Substring whose presence anywhere in the log marks a transient run.
const TRANSIENT_MARKER: &str = "Courant";

/// What to do with a recognised record holding an unparsable number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Log a warning and treat the line as unclassified.
    #[default]
    Skip,
    /// Abort the parse with `AnalyzerError::MalformedRecord`.
    Fail,
}

/// Result of a parse pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub mode: SimulationMode,
    pub series: RawSeriesMap,
    /// Lines skipped because of malformed numbers.
    pub malformed_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    PreLoop,
    InLoop,
}

/// Decide the simulation mode from the whole log, regardless of the loop marker.
pub fn detect_mode(content: &str) -> SimulationMode {
    if content.lines().any(|line| line.contains(TRANSIENT_MARKER)) {
        SimulationMode::Transient
    } else {
        SimulationMode::SteadyState
    }
}

/// Parse a log into raw series.
///
/// # Parameters
///
/// * `content` - Full log text
/// * `fields` - Fields whose residuals are tracked (from the field detector)
/// * `policy` - Handling of malformed numeric tokens
///
/// # Returns
///
/// The detected mode and every required series in encounter order. Series are
/// present even when empty so the aligner can report them.
pub fn parse_log(content: &str, fields: &FieldSet, policy: MalformedPolicy) -> Result<ParsedLog, AnalyzerError> {
    let mode = detect_mode(content);
    log::info!("Detected {} simulation", mode);

    let mut series = RawSeriesMap::with_keys(SeriesKey::required(mode, fields));
    let mut state = ParseState::PreLoop;
    let mut malformed_lines = 0;

    for (index, line) in content.lines().enumerate() {
        if state == ParseState::PreLoop {
            if line.contains(LOOP_START_MARKER) {
                state = ParseState::InLoop;
            }
            continue;
        }

        let record = match classify_line(line, fields) {
            Ok(record) => record,
            Err(malformed) => match policy {
                MalformedPolicy::Fail => {
                    return Err(AnalyzerError::MalformedRecord {
                        line: index + 1,
                        record: malformed.record,
                        token: malformed.token,
                    });
                }
                MalformedPolicy::Skip => {
                    log::warn!(
                        "Skipping malformed {} record on line {}: '{}'",
                        malformed.record,
                        index + 1,
                        malformed.token
                    );
                    malformed_lines += 1;
                    continue;
                }
            },
        };

        match record {
            LineRecord::TimeMarker(time) => series.push(SeriesKey::Time, time),
            LineRecord::CourantSummary { mean, max } => {
                series.push(SeriesKey::CourantMean, mean);
                series.push(SeriesKey::CourantMax, max);
            }
            LineRecord::ContinuityErrorSummary { local, global, cumulative } => {
                series.push(SeriesKey::ContinuityLocal, local);
                series.push(SeriesKey::ContinuityGlobal, global);
                series.push(SeriesKey::ContinuityCumulative, cumulative);
            }
            LineRecord::FieldResidual { field, value } => series.push(SeriesKey::Residual(field), value),
            LineRecord::Unclassified => {}
        }
    }

    if state == ParseState::PreLoop {
        log::warn!("'{}' never appeared; no records were parsed", LOOP_START_MARKER);
    }
    for (key, values) in series.iter() {
        log::debug!("Parsed {} sample(s) of {}", values.len(), key);
    }

    Ok(ParsedLog {
        mode,
        series,
        malformed_lines,
    })
}
