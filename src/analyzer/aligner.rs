//! Reconcile series logged at different rates into one rectangular table.
//!
//! Quantities logged once per sub-iteration appear `k` times per solver step.
//! They are reduced to the last sample of each group of `k`, the value at the
//! end of the step.

use super::error::{AnalyzerError, SeriesLength};
use super::types::{AlignedTable, FieldSet, RawSeriesMap, SeriesKey, SimulationMode};

/// Align every required series to the length of the time series.
///
/// # Parameters
///
/// * `raw` - Series from the parser, consumed
/// * `mode` - Decides whether Courant series are required
/// * `fields` - Fields whose residual series are required
///
/// # Returns
///
/// The aligned table, `NoIterationData` if no time record was parsed, or
/// `AlignmentMismatch` listing every series that could not be aligned.
pub fn align(mut raw: RawSeriesMap, mode: SimulationMode, fields: &FieldSet) -> Result<AlignedTable, AnalyzerError> {
    let reference_length = raw.len_of(&SeriesKey::Time);
    if reference_length == 0 {
        return Err(AnalyzerError::NoIterationData);
    }

    let required = SeriesKey::required(mode, fields);
    for key in &required {
        // Absent series are reported by the validator with length zero
        let Some(values) = raw.get_mut(key) else {
            continue;
        };
        if values.len() == reference_length {
            continue;
        }
        match downsample(values, reference_length) {
            Some(reduced) => {
                log::debug!(
                    "Down-sampled {} from {} to {} samples (ratio {})",
                    key,
                    values.len(),
                    reduced.len(),
                    values.len() / reference_length
                );
                *values = reduced;
            }
            None => log::warn!(
                "{} has {} samples, which is not a multiple of the {} time records",
                key,
                values.len(),
                reference_length
            ),
        }
    }

    validate(&raw, &required, reference_length)?;

    let mut columns = raw.into_inner();
    columns.retain(|key, _| required.contains(key));
    Ok(AlignedTable::from_validated(mode, columns, reference_length))
}

/// Keep the samples at indices `k-1, 2k-1, ...` where `k = len / reference_length`.
///
/// Returns `None` when the length is not an exact positive multiple of the
/// reference length; such series are left for the validator to report.
pub fn downsample(values: &[f64], reference_length: usize) -> Option<Vec<f64>> {
    if reference_length == 0 || values.len() < reference_length || values.len() % reference_length != 0 {
        return None;
    }
    let ratio = values.len() / reference_length;
    Some(values.iter().skip(ratio - 1).step_by(ratio).take(reference_length).copied().collect())
}

/// Check that every required series has the reference length.
///
/// On any mismatch the error lists every required series with its length,
/// so the offending ones can be read against the time series.
pub fn validate(raw: &RawSeriesMap, required: &[SeriesKey], reference_length: usize) -> Result<(), AnalyzerError> {
    if required.iter().all(|key| raw.len_of(key) == reference_length) {
        return Ok(());
    }
    let lengths = required
        .iter()
        .map(|key| SeriesLength {
            key: key.clone(),
            length: raw.len_of(key),
        })
        .collect();
    Err(AnalyzerError::AlignmentMismatch {
        reference_length,
        lengths,
    })
}
