//! Type definitions shared by the analyzer stages.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Whether the solver advanced in physical time or iterated to convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    /// Courant numbers were reported; the index axis is physical time.
    Transient,
    /// No Courant output; the index axis is the iteration counter.
    SteadyState,
}

impl SimulationMode {
    pub fn is_transient(self) -> bool {
        self == SimulationMode::Transient
    }

    /// Label of the index axis, used both as CSV header and plot x label.
    pub fn axis_label(self) -> &'static str {
        match self {
            SimulationMode::Transient => "Time (s)",
            SimulationMode::SteadyState => "Iteration",
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationMode::Transient => write!(f, "transient"),
            SimulationMode::SteadyState => write!(f, "steady-state"),
        }
    }
}

/// Name of a solved-for scalar field, e.g. `Ux` or `p_rgh`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName(String);

impl FieldName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sorted, deduplicated set of fields discovered in the first solver step.
///
/// Built once by the field detector and passed by reference to the parser,
/// the aligner and the exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(BTreeSet<FieldName>);

impl FieldSet {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldName> {
        self.0.iter()
    }

    /// Look up the stored name so callers can key series without reallocating on misses.
    pub fn get(&self, name: &str) -> Option<&FieldName> {
        self.0.get(name)
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(FieldName::new).collect())
    }
}

/// Identifies one tracked quantity.
///
/// The derived ordering is the export column order: index axis, Courant
/// numbers, continuity errors, then residuals sorted by field name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKey {
    Time,
    CourantMean,
    CourantMax,
    ContinuityLocal,
    ContinuityGlobal,
    ContinuityCumulative,
    Residual(FieldName),
}

impl SeriesKey {
    /// Keys every log is expected to produce for the given mode and field set.
    pub fn required(mode: SimulationMode, fields: &FieldSet) -> Vec<SeriesKey> {
        let mut keys = vec![SeriesKey::Time];
        if mode.is_transient() {
            keys.push(SeriesKey::CourantMean);
            keys.push(SeriesKey::CourantMax);
        }
        keys.push(SeriesKey::ContinuityLocal);
        keys.push(SeriesKey::ContinuityGlobal);
        keys.push(SeriesKey::ContinuityCumulative);
        keys.extend(fields.iter().cloned().map(SeriesKey::Residual));
        keys
    }

    /// Column header used in the CSV export.
    pub fn column_label(&self, mode: SimulationMode) -> String {
        match self {
            SeriesKey::Time => mode.axis_label().to_string(),
            SeriesKey::CourantMean => "Courant Mean".to_string(),
            SeriesKey::CourantMax => "Courant Max".to_string(),
            SeriesKey::ContinuityLocal => "Local Continuity Error".to_string(),
            SeriesKey::ContinuityGlobal => "Global Continuity Error".to_string(),
            SeriesKey::ContinuityCumulative => "Cumulative Continuity Error".to_string(),
            SeriesKey::Residual(name) => name.to_string(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Time => write!(f, "time"),
            SeriesKey::CourantMean => write!(f, "mean Courant number"),
            SeriesKey::CourantMax => write!(f, "max Courant number"),
            SeriesKey::ContinuityLocal => write!(f, "local continuity error"),
            SeriesKey::ContinuityGlobal => write!(f, "global continuity error"),
            SeriesKey::ContinuityCumulative => write!(f, "cumulative continuity error"),
            SeriesKey::Residual(name) => write!(f, "{} residual", name),
        }
    }
}

/// One classified log line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineRecord {
    /// `Time = <t>` at the start of a solver step.
    TimeMarker(f64),
    /// `Courant Number mean: <m> max: <M>`.
    CourantSummary { mean: f64, max: f64 },
    /// `time step continuity errors : sum local = ..., global = ..., cumulative = ...`.
    ContinuityErrorSummary { local: f64, global: f64, cumulative: f64 },
    /// `Solving for <field>, Initial residual = <r>` for a known field.
    FieldResidual { field: FieldName, value: f64 },
    /// Anything else: banners, timing, boundary info, unknown fields.
    Unclassified,
}

/// Per-quantity sample sequences in log encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeriesMap {
    series: BTreeMap<SeriesKey, Vec<f64>>,
}

impl RawSeriesMap {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map with an empty sequence for each required key.
    pub fn with_keys(keys: impl IntoIterator<Item = SeriesKey>) -> Self {
        Self {
            series: keys.into_iter().map(|key| (key, Vec::new())).collect(),
        }
    }

    pub fn push(&mut self, key: SeriesKey, value: f64) {
        self.series.entry(key).or_default().push(value);
    }

    #[cfg(test)]
    pub fn insert(&mut self, key: SeriesKey, values: Vec<f64>) {
        self.series.insert(key, values);
    }

    #[cfg(test)]
    pub fn get(&self, key: &SeriesKey) -> Option<&[f64]> {
        self.series.get(key).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, key: &SeriesKey) -> Option<&mut Vec<f64>> {
        self.series.get_mut(key)
    }

    /// Number of samples recorded for `key`, zero when the key never appeared.
    pub fn len_of(&self, key: &SeriesKey) -> usize {
        self.series.get(key).map_or(0, Vec::len)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeriesKey, &Vec<f64>)> {
        self.series.iter()
    }

    pub(crate) fn into_inner(self) -> BTreeMap<SeriesKey, Vec<f64>> {
        self.series
    }
}

/// Rectangular table of equally long series, produced only by the aligner.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    mode: SimulationMode,
    columns: BTreeMap<SeriesKey, Vec<f64>>,
    rows: usize,
}

impl AlignedTable {
    /// Callers must guarantee every column has `rows` samples and that a time column exists.
    pub(crate) fn from_validated(mode: SimulationMode, columns: BTreeMap<SeriesKey, Vec<f64>>, rows: usize) -> Self {
        debug_assert!(columns.values().all(|c| c.len() == rows));
        Self { mode, columns, rows }
    }

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    /// Number of aligned rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// The index axis: time values (transient) or iteration numbers (steady).
    pub fn index(&self) -> &[f64] {
        self.column(&SeriesKey::Time).unwrap_or(&[])
    }

    pub fn column(&self, key: &SeriesKey) -> Option<&[f64]> {
        self.columns.get(key).map(Vec::as_slice)
    }

    /// Columns in export order.
    pub fn columns(&self) -> impl Iterator<Item = (&SeriesKey, &[f64])> {
        self.columns.iter().map(|(key, values)| (key, values.as_slice()))
    }

    /// Values of row `i` in column order.
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.columns.values().map(|c| c[i]).collect()
    }

    /// Give the columns back as a raw map, e.g. to realign.
    #[cfg(test)]
    pub fn into_raw(self) -> RawSeriesMap {
        let mut raw = RawSeriesMap::new();
        for (key, values) in self.columns {
            raw.insert(key, values);
        }
        raw
    }
}
