//! Export of the aligned table as charts and CSV.
//!
//! The exporter builds chart descriptions from the table (smoothing each
//! plotted series), hands them to a `PlotRenderer`, then writes the unsmoothed
//! table as CSV. Either every artifact is written or none is left behind.

pub mod artifacts;
pub mod csv_writer;
pub mod plot;
pub mod smoothing;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::analyzer::{AlignedTable, SeriesKey};

pub use artifacts::ArtifactGuard;
pub use plot::{ChartKind, ChartSpec, Curve, PlotRenderer, PngRenderer, YScale};
pub use smoothing::{Smoother, SmoothingConfig, SmoothingMethod};

/// Where and how artifacts are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub scale: YScale,
}

impl ExportOptions {
    pub fn chart_path(&self, kind: ChartKind) -> PathBuf {
        self.output_dir.join(format!("{}_{}.png", self.prefix, kind.suffix()))
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.prefix))
    }
}

/// Build the charts for a table: Courant numbers (transient only), continuity errors and residuals.
pub fn chart_specs(table: &AlignedTable, smoother: &dyn Smoother, scale: YScale) -> Vec<ChartSpec> {
    let curve = |key: &SeriesKey, label: String| Curve {
        label,
        values: smoother.smooth(table.column(key).unwrap_or(&[])),
    };
    let chart = |kind: ChartKind, curves: Vec<Curve>| ChartSpec {
        kind,
        x_label: table.mode().axis_label(),
        x: table.index().to_vec(),
        curves,
        scale,
    };

    let mut charts = Vec::with_capacity(3);
    if table.mode().is_transient() {
        charts.push(chart(
            ChartKind::Courant,
            vec![
                curve(&SeriesKey::CourantMean, "Courant Mean".to_string()),
                curve(&SeriesKey::CourantMax, "Courant Max".to_string()),
            ],
        ));
    }
    charts.push(chart(
        ChartKind::Continuity,
        vec![
            curve(&SeriesKey::ContinuityLocal, "Local Error".to_string()),
            curve(&SeriesKey::ContinuityGlobal, "Global Error".to_string()),
            curve(&SeriesKey::ContinuityCumulative, "Cumulative Error".to_string()),
        ],
    ));
    let residuals = table
        .columns()
        .filter_map(|(key, _)| match key {
            SeriesKey::Residual(field) => Some(curve(key, format!("{} Residual", field))),
            _ => None,
        })
        .collect();
    charts.push(chart(ChartKind::Residual, residuals));
    charts
}

/// Writes the charts and the CSV for one aligned table.
pub struct Exporter<'a> {
    renderer: &'a dyn PlotRenderer,
    smoother: &'a dyn Smoother,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(renderer: &'a dyn PlotRenderer, smoother: &'a dyn Smoother, options: ExportOptions) -> Self {
        Self {
            renderer,
            smoother,
            options,
        }
    }

    /// Write every artifact, returning their paths in write order.
    ///
    /// On failure, files already written by this call are removed.
    pub fn export(&self, table: &AlignedTable) -> Result<Vec<PathBuf>> {
        let mut guard = ArtifactGuard::new();

        for chart in chart_specs(table, self.smoother, self.options.scale) {
            let path = self.options.chart_path(chart.kind);
            guard.track(&path);
            self.renderer.render(&chart, &path)?;
            log::info!("Wrote {}", path.display());
        }

        let csv_path = self.options.csv_path();
        guard.track(&csv_path);
        csv_writer::write_table_file(table, &csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        log::info!("Wrote {}", csv_path.display());

        Ok(guard.commit())
    }
}
