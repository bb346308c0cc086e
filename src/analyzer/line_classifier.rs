//! Classify individual solver log lines into typed records.
//!
//! Recognised line formats:
//!
//! ```text
//! Time = 0.0125
//! Courant Number mean: 0.0213 max: 0.4871
//! time step continuity errors : sum local = 1.2e-05, global = -3.4e-06, cumulative = 7.8e-05
//! smoothSolver:  Solving for Ux, Initial residual = 0.0031, Final residual = 2.1e-06, No Iterations 3
//! ```
//!
//! Numbers are captured with a loose token class and converted afterwards, so a
//! line that has the right shape but a broken number is reported as malformed
//! instead of silently falling through.

use std::sync::LazyLock;

use regex::Regex;

use super::error::{MalformedToken, RecordKind};
use super::types::{FieldSet, LineRecord};

const NUMBER: &str = r"([0-9.eE+\-]+)";

static TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"^Time = {NUMBER}")).expect("valid regex"));
static COURANT_MEAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"mean: {NUMBER}")).expect("valid regex"));
static COURANT_MAX: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"max: {NUMBER}")).expect("valid regex"));
static CONTINUITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"time step continuity errors : sum local = {NUMBER}, global = {NUMBER}, cumulative = {NUMBER}"
    ))
    .expect("valid regex")
});
static RESIDUAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"Solving for (\S+), Initial residual = {NUMBER}")).expect("valid regex"));

/// Prefix of the Courant summary line.
pub const COURANT_PREFIX: &str = "Courant Number";

/// Classify one log line.
///
/// # Parameters
///
/// * `line` - A single log line without its line terminator
/// * `fields` - Fields whose residuals are tracked
///
/// # Returns
///
/// The matching record (with absolute values), `LineRecord::Unclassified` for
/// lines of no interest, or `Err` when a recognised record holds a token that
/// is not a finite number.
pub fn classify_line(line: &str, fields: &FieldSet) -> Result<LineRecord, MalformedToken> {
    if let Some(caps) = TIME.captures(line) {
        let time = parse_number(&caps[1], RecordKind::Time)?;
        return Ok(LineRecord::TimeMarker(time));
    }

    if line.starts_with(COURANT_PREFIX) {
        return classify_courant(line);
    }

    if let Some(caps) = CONTINUITY.captures(line) {
        return Ok(LineRecord::ContinuityErrorSummary {
            local: parse_number(&caps[1], RecordKind::Continuity)?,
            global: parse_number(&caps[2], RecordKind::Continuity)?,
            cumulative: parse_number(&caps[3], RecordKind::Continuity)?,
        });
    }

    if let Some(caps) = RESIDUAL.captures(line) {
        // Residuals of fields outside the first solver step are not tracked
        let Some(field) = fields.get(&caps[1]) else {
            return Ok(LineRecord::Unclassified);
        };
        return Ok(LineRecord::FieldResidual {
            field: field.clone(),
            value: parse_number(&caps[2], RecordKind::Residual)?,
        });
    }

    Ok(LineRecord::Unclassified)
}

/// Both `mean:` and `max:` must be present for the line to count.
fn classify_courant(line: &str) -> Result<LineRecord, MalformedToken> {
    match (COURANT_MEAN.captures(line), COURANT_MAX.captures(line)) {
        (Some(mean), Some(max)) => Ok(LineRecord::CourantSummary {
            mean: parse_number(&mean[1], RecordKind::Courant)?,
            max: parse_number(&max[1], RecordKind::Courant)?,
        }),
        _ => Ok(LineRecord::Unclassified),
    }
}

/// Convert a captured token to its absolute value.
fn parse_number(token: &str, record: RecordKind) -> Result<f64, MalformedToken> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value.abs()),
        _ => Err(MalformedToken {
            record,
            token: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::FieldName;

    fn fields() -> FieldSet {
        ["Ux", "Uy", "p", "alpha.water"].into_iter().collect()
    }

    #[test]
    fn test_time_marker() {
        assert_eq!(classify_line("Time = 0.01", &fields()), Ok(LineRecord::TimeMarker(0.01)));
        assert_eq!(classify_line("Time = 1.5e-03", &fields()), Ok(LineRecord::TimeMarker(1.5e-3)));
        assert_eq!(classify_line("Time = 250", &fields()), Ok(LineRecord::TimeMarker(250.0)));
    }

    #[test]
    fn test_time_marker_with_unit_suffix() {
        assert_eq!(classify_line("Time = 0.2s", &fields()), Ok(LineRecord::TimeMarker(0.2)));
    }

    #[test]
    fn test_time_marker_must_start_line() {
        assert_eq!(classify_line("ExecutionTime = 0.5 s  ClockTime = 1 s", &fields()), Ok(LineRecord::Unclassified));
        assert_eq!(classify_line("deltaT = 0.001", &fields()), Ok(LineRecord::Unclassified));
    }

    #[test]
    fn test_courant_summary() {
        let line = "Courant Number mean: 0.0213 max: 0.4871";
        assert_eq!(
            classify_line(line, &fields()),
            Ok(LineRecord::CourantSummary { mean: 0.0213, max: 0.4871 })
        );
    }

    #[test]
    fn test_courant_requires_both_values() {
        assert_eq!(classify_line("Courant Number mean: 0.0213", &fields()), Ok(LineRecord::Unclassified));
    }

    #[test]
    fn test_interface_courant_is_not_courant_summary() {
        let line = "Interface Courant Number mean: 0.001 max: 0.2";
        assert_eq!(classify_line(line, &fields()), Ok(LineRecord::Unclassified));
    }

    #[test]
    fn test_continuity_summary_drops_sign() {
        let line = "time step continuity errors : sum local = 1.2e-05, global = -3.4e-06, cumulative = 7.8e-05";
        assert_eq!(
            classify_line(line, &fields()),
            Ok(LineRecord::ContinuityErrorSummary {
                local: 1.2e-05,
                global: 3.4e-06,
                cumulative: 7.8e-05,
            })
        );
    }

    #[test]
    fn test_field_residual() {
        let line = "smoothSolver:  Solving for Ux, Initial residual = 0.005, Final residual = 1e-06, No Iterations 2";
        assert_eq!(
            classify_line(line, &fields()),
            Ok(LineRecord::FieldResidual {
                field: FieldName::new("Ux"),
                value: 0.005,
            })
        );
    }

    #[test]
    fn test_field_residual_dotted_name() {
        let line = "MULES: Solving for alpha.water, Initial residual = 0, Final residual = 0, No Iterations 0";
        assert_eq!(
            classify_line(line, &fields()),
            Ok(LineRecord::FieldResidual {
                field: FieldName::new("alpha.water"),
                value: 0.0,
            })
        );
    }

    #[test]
    fn test_field_residual_exact_name_only() {
        let line = "smoothSolver:  Solving for Uxx, Initial residual = 0.005, Final residual = 1e-06, No Iterations 2";
        assert_eq!(classify_line(line, &fields()), Ok(LineRecord::Unclassified));
        let line = "smoothSolver:  Solving for k, Initial residual = 0.005, Final residual = 1e-06, No Iterations 2";
        assert_eq!(classify_line(line, &fields()), Ok(LineRecord::Unclassified));
    }

    #[test]
    fn test_malformed_token() {
        let line = "time step continuity errors : sum local = 1.2e-05, global = 1.2.3, cumulative = 7.8e-05";
        assert_eq!(
            classify_line(line, &fields()),
            Err(MalformedToken {
                record: RecordKind::Continuity,
                token: "1.2.3".to_string(),
            })
        );
        assert!(classify_line("Time = e", &fields()).is_err());
    }

    #[test]
    fn test_unclassified_lines() {
        for line in ["", "PIMPLE: iteration 1", "End", "    Create time", "bounding omega, min: -1 max: 2 average: 0.5"] {
            assert_eq!(classify_line(line, &fields()), Ok(LineRecord::Unclassified));
        }
    }
}
