use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueHint};
use env_logger::Builder;
use log::{LevelFilter, info};

use crate::analyzer::{Analysis, FieldName, LogLoader, SeriesKey, analyze};
use crate::config::RunConfig;
use crate::export::{Exporter, PlotRenderer, PngRenderer, SmoothingMethod};

mod analyzer;
mod config;
mod export;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Plot residuals, Courant numbers and continuity errors from an OpenFOAM solver log and export them as CSV"
)]
struct Cli {
    /// Path to the OpenFOAM log file (asked for interactively when omitted)
    #[arg(long, value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Prefix of the written PNG and CSV files
    #[arg(long)]
    output_prefix: Option<String>,

    /// Directory the artifacts are written to
    #[arg(long, value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Smoothing applied to plotted curves
    #[arg(long, value_enum)]
    smoothing: Option<SmoothingMethod>,

    /// Gaussian kernel width in samples
    #[arg(long)]
    sigma: Option<f64>,

    /// Share of samples in each LOWESS neighbourhood
    #[arg(long)]
    frac: Option<f64>,

    /// Abort on malformed numbers instead of skipping the line
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Load the configuration file, if any, and apply command-line overrides.
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path).map_err(|e| anyhow!(e))?,
            None => RunConfig::default(),
        };
        if let Some(prefix) = &self.output_prefix {
            config.output_prefix = prefix.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(method) = self.smoothing {
            config.smoothing.method = method;
        }
        if let Some(sigma) = self.sigma {
            config.smoothing.sigma = sigma;
        }
        if let Some(frac) = self.frac {
            config.smoothing.frac = frac;
        }
        config.strict |= self.strict;
        config.validate().map_err(|e| anyhow!("Invalid settings: {}", e))?;
        Ok(config)
    }
}

/// What a successful run produced.
#[derive(Debug)]
struct RunSummary {
    artifacts: Vec<PathBuf>,
    malformed_lines: usize,
    elapsed: Duration,
}

fn prompt_for_path() -> Result<PathBuf> {
    print!("\nPlease enter the log file name: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).context("Failed to read the log file name")?;
    Ok(PathBuf::from(line.trim()))
}

fn print_parsed_quantities(analysis: &Analysis, path: &Path) {
    let fields: Vec<&str> = analysis.fields.iter().map(FieldName::as_str).collect();
    println!("\nEvaluating {}", path.display());
    println!("Solved-for fields: {}", fields.join(", "));
    println!("Parsing:");
    for (key, _) in analysis.table.columns() {
        match key {
            SeriesKey::Time if !analysis.table.mode().is_transient() => println!("    iteration"),
            _ => println!("    {}", key),
        }
    }
}

/// Load, analyze and export one log.
///
/// Nothing is written unless parsing and alignment succeed, and a failed
/// export removes what it already wrote.
fn run(log_path: &Path, config: &RunConfig, renderer: &dyn PlotRenderer) -> Result<RunSummary> {
    let start = Instant::now();

    let log = LogLoader::open(log_path)?;
    println!("\nThis may take a few minutes. Please wait.");
    let analysis = analyze(&log, config.malformed_policy())?;
    print_parsed_quantities(&analysis, log.path());

    let smoother = config.smoothing.build();
    let artifacts = Exporter::new(renderer, smoother.as_ref(), config.export_options()).export(&analysis.table)?;

    Ok(RunSummary {
        artifacts,
        malformed_lines: analysis.malformed_lines,
        elapsed: start.elapsed(),
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("foamlog"), if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .parse_default_env()
        .init();

    println!("\n============\n| foamlog  |\n============");
    println!("Evaluation of OpenFOAM solver logs");

    let outcome = cli.run_config().and_then(|config| {
        let log_path = match &cli.file {
            Some(path) => path.clone(),
            None => prompt_for_path()?,
        };
        info!("Using configuration {:?}", config);
        let renderer = PngRenderer::new(config.plot_size(), config.font.as_deref());
        run(&log_path, &config, &renderer)
    });

    match outcome {
        Ok(summary) => {
            println!("\nFinished evaluating log file.");
            println!("Graphs are saved and the data are exported as");
            for path in &summary.artifacts {
                println!("    {}", path.display());
            }
            if summary.malformed_lines > 0 {
                println!("\n{} malformed line(s) were skipped.", summary.malformed_lines);
            }
            println!("\nExecution time = {:.3} s.", summary.elapsed.as_secs_f64());
            println!("Processes completed successfully.\n");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\nError: {:#}\n", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzerError;
    use crate::export::ChartSpec;
    use std::fs;

    struct PlaceholderRenderer;

    impl PlotRenderer for PlaceholderRenderer {
        fn render(&self, _chart: &ChartSpec, path: &Path) -> Result<()> {
            fs::write(path, b"png")?;
            Ok(())
        }
    }

    fn config_for(dir: &Path) -> RunConfig {
        RunConfig {
            output_dir: dir.to_path_buf(),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_missing_input_produces_no_artifacts() {
        let out = tempfile::tempdir().unwrap();
        let missing = out.path().join("log.pimpleFoam");
        let err = run(&missing, &config_for(out.path()), &PlaceholderRenderer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalyzerError>(),
            Some(AnalyzerError::InputNotFound { .. })
        ));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_alignment_failure_produces_no_artifacts() {
        let out = tempfile::tempdir().unwrap();
        let log_path = out.path().join("log.simpleFoam");
        fs::write(
            &log_path,
            "\
Starting time loop
Time = 1
smoothSolver:  Solving for Ux, Initial residual = 1, Final residual = 0.1, No Iterations 1
time step continuity errors : sum local = 1e-3, global = 1e-4, cumulative = 1e-4
Time = 2
time step continuity errors : sum local = 1e-3, global = 1e-4, cumulative = 2e-4
",
        )
        .unwrap();
        let err = run(&log_path, &config_for(out.path()), &PlaceholderRenderer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalyzerError>(),
            Some(AnalyzerError::AlignmentMismatch { .. })
        ));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_successful_run_writes_all_artifacts() {
        let out = tempfile::tempdir().unwrap();
        let log_path = out.path().join("log.pimpleFoam");
        fs::write(
            &log_path,
            "\
Courant Number mean: 0 max: 0
Starting time loop
Courant Number mean: 0.1 max: 0.5
Time = 0.01
smoothSolver:  Solving for Ux, Initial residual = 0.005, Final residual = 1e-6, No Iterations 1
smoothSolver:  Solving for Ux, Initial residual = 0.003, Final residual = 1e-6, No Iterations 1
time step continuity errors : sum local = 1.2e-05, global = -3.4e-06, cumulative = 7.8e-05
Courant Number mean: 0.2 max: 0.6
Time = 0.02
smoothSolver:  Solving for Ux, Initial residual = 0.002, Final residual = 1e-6, No Iterations 1
smoothSolver:  Solving for Ux, Initial residual = 0.001, Final residual = 1e-6, No Iterations 1
time step continuity errors : sum local = 1.3e-05, global = 3.5e-06, cumulative = 7.9e-05
",
        )
        .unwrap();
        let summary = run(&log_path, &config_for(out.path()), &PlaceholderRenderer).unwrap();
        assert_eq!(summary.artifacts.len(), 4);
        assert_eq!(summary.malformed_lines, 0);

        let csv = fs::read_to_string(out.path().join("output.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Time (s),Courant Mean,Courant Max,Local Continuity Error,Global Continuity Error,Cumulative Continuity Error,Ux"
        );
        assert_eq!(lines[1], "0.01,0.1,0.5,0.000012,0.0000034,0.000078,0.003");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "foamlog",
            "--file",
            "log.simpleFoam",
            "--output-prefix",
            "cavity",
            "--smoothing",
            "gaussian",
            "--sigma",
            "4",
            "--strict",
        ]);
        let config = cli.run_config().unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("log.simpleFoam")));
        assert_eq!(config.output_prefix, "cavity");
        assert_eq!(config.smoothing.method, SmoothingMethod::Gaussian);
        assert_eq!(config.smoothing.sigma, 4.0);
        assert!(config.strict);
    }

    #[test]
    fn test_cli_rejects_invalid_smoothing_parameters() {
        for args in [["--sigma", "NaN"], ["--sigma", "0"], ["--frac", "0"], ["--frac", "1.5"]] {
            let cli = Cli::parse_from(["foamlog"].into_iter().chain(args));
            let err = cli.run_config().unwrap_err();
            assert!(err.to_string().starts_with("Invalid settings"), "{err}");
        }
    }

    #[test]
    fn test_cli_file_is_optional() {
        let cli = Cli::parse_from(["foamlog"]);
        assert_eq!(cli.file, None);
        assert_eq!(cli.run_config().unwrap(), RunConfig::default());
    }
}
