//! Analyzer module for solver log parsing and series alignment.
//!
//! Provides functionality for:
//! - Discovering the solved-for fields from the first solver step
//! - Classifying log lines and extracting per-step values
//! - Aligning series logged at different rates into one table
//!
//! Data flows `detect_fields` -> `parse_log` -> `align`; `analyze` runs all three.

pub mod aligner;
pub mod error;
pub mod field_detector;
pub mod line_classifier;
pub mod log_loader;
pub mod log_parser;
pub mod types;

pub use aligner::align;
pub use error::AnalyzerError;
pub use field_detector::detect_fields;
pub use log_loader::LogLoader;
pub use log_parser::{MalformedPolicy, parse_log};
pub use types::{AlignedTable, FieldName, FieldSet, SeriesKey};

/// Outcome of a complete analysis of one log.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub fields: FieldSet,
    pub table: AlignedTable,
    pub malformed_lines: usize,
}

/// Detect fields, parse and align the content of `log`.
pub fn analyze(log: &LogLoader, policy: MalformedPolicy) -> Result<Analysis, AnalyzerError> {
    let fields = detect_fields(log.content());
    let parsed = parse_log(log.content(), &fields, policy)?;
    let table = align(parsed.series, parsed.mode, &fields)?;
    log::info!("Aligned {} series over {} rows", table.columns().count(), table.len());

    Ok(Analysis {
        fields,
        table,
        malformed_lines: parsed.malformed_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::SimulationMode;

    #[test]
    fn test_scenario_steady_state_without_courant() {
        let log = LogLoader::from_content(
            "steady.log",
            "\
Starting time loop
Time = 1
smoothSolver:  Solving for Ux, Initial residual = 1, Final residual = 0.01, No Iterations 2
GAMG:  Solving for p, Initial residual = 1, Final residual = 0.01, No Iterations 12
time step continuity errors : sum local = 1e-03, global = 1e-04, cumulative = 1e-04
Time = 2
smoothSolver:  Solving for Ux, Initial residual = 0.5, Final residual = 0.01, No Iterations 2
GAMG:  Solving for p, Initial residual = 0.4, Final residual = 0.01, No Iterations 12
time step continuity errors : sum local = 1e-04, global = 1e-05, cumulative = 2e-04
End
",
        );
        let analysis = analyze(&log, MalformedPolicy::Skip).unwrap();
        assert_eq!(analysis.table.mode(), SimulationMode::SteadyState);
        assert_eq!(analysis.table.column(&SeriesKey::CourantMean), None);
        assert_eq!(analysis.table.column(&SeriesKey::CourantMax), None);
        assert_eq!(analysis.table.len(), 2);
        assert_eq!(
            analysis.table.columns().map(|(key, _)| key.column_label(SimulationMode::SteadyState)).collect::<Vec<_>>(),
            vec![
                "Iteration",
                "Local Continuity Error",
                "Global Continuity Error",
                "Cumulative Continuity Error",
                "Ux",
                "p"
            ]
        );
    }

    #[test]
    fn test_scenario_transient_sub_iterations() {
        let log = LogLoader::from_content(
            "transient.log",
            "\
Courant Number mean: 0 max: 0
Starting time loop
Courant Number mean: 0.05 max: 0.3
Time = 0.01
smoothSolver:  Solving for Ux, Initial residual = 0.005, Final residual = 1e-06, No Iterations 1
time step continuity errors : sum local = 1.2e-05, global = -3.4e-06, cumulative = 7.8e-05
smoothSolver:  Solving for Ux, Initial residual = 0.003, Final residual = 1e-06, No Iterations 1
time step continuity errors : sum local = 1.1e-05, global = -3.3e-06, cumulative = 7.7e-05
",
        );
        let analysis = analyze(&log, MalformedPolicy::Skip).unwrap();
        let table = &analysis.table;
        assert_eq!(table.mode(), SimulationMode::Transient);
        assert_eq!(table.index(), &[0.01]);
        assert_eq!(table.column(&SeriesKey::Residual(FieldName::new("Ux"))), Some(&[0.003][..]));
        assert_eq!(table.column(&SeriesKey::ContinuityGlobal), Some(&[3.3e-06][..]));
        assert_eq!(table.column(&SeriesKey::CourantMean), Some(&[0.05][..]));
        assert_eq!(table.column(&SeriesKey::CourantMax).map(<[f64]>::len), Some(table.len()));
    }

    #[test]
    fn test_log_without_loop_has_no_iteration_data() {
        let log = LogLoader::from_content("setup.log", "Create mesh\nTime = 0\nEnd\n");
        let err = analyze(&log, MalformedPolicy::Skip).unwrap_err();
        assert!(matches!(err, AnalyzerError::NoIterationData));
    }
}
