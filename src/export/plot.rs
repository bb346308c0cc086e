//! Chart descriptions and the PNG renderer.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use plotters::coord::Shift;
use plotters::coord::ranged1d::{AsRangedCoord, ValueFormatter};
use plotters::prelude::*;
use plotters::style::{FontFamily, FontStyle, register_font};
use serde::Deserialize;

/// Y axis scaling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YScale {
    #[default]
    Log,
    Linear,
}

/// Which of the output charts a `ChartSpec` describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Courant,
    Continuity,
    Residual,
}

impl ChartKind {
    /// File name suffix, e.g. `output_courant.png`.
    pub fn suffix(self) -> &'static str {
        match self {
            ChartKind::Courant => "courant",
            ChartKind::Continuity => "continuity",
            ChartKind::Residual => "residual",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            ChartKind::Courant => "Courant Numbers (-)",
            ChartKind::Continuity => "Time Step Continuity Errors (-)",
            ChartKind::Residual => "Residuals (-)",
        }
    }
}

/// One labelled curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub values: Vec<f64>,
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x_label: &'static str,
    pub x: Vec<f64>,
    pub curves: Vec<Curve>,
    pub scale: YScale,
}

/// Draws a chart to a file.
pub trait PlotRenderer {
    fn render(&self, chart: &ChartSpec, path: &Path) -> Result<()>;
}

/// Font files tried when no font is configured.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Renders charts to PNG with the bitmap backend.
///
/// Text needs a TrueType font. Without one the chart is drawn without axis
/// labels or legend.
pub struct PngRenderer {
    size: (u32, u32),
    has_font: bool,
}

impl PngRenderer {
    pub fn new(size: (u32, u32), font: Option<&Path>) -> Self {
        let has_font = match load_font(font) {
            Ok(path) => {
                log::debug!("Using font {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("Charts will be drawn without text: {:#}", e);
                false
            }
        };
        Self { size, has_font }
    }

    fn draw(&self, chart: &ChartSpec, path: &Path) -> Result<()> {
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_min, x_max) = padded_range(chart.x.iter().copied());
        let points: Vec<Vec<(f64, f64)>> = chart
            .curves
            .iter()
            .map(|curve| {
                chart
                    .x
                    .iter()
                    .copied()
                    .zip(curve.values.iter().copied())
                    .filter(|(_, y)| y.is_finite() && (chart.scale == YScale::Linear || *y > 0.0))
                    .collect()
            })
            .collect();
        let (y_min, y_max) = y_range(points.iter().flatten().map(|(_, y)| *y), chart.scale);

        match chart.scale {
            YScale::Log => self.draw_curves(&root, chart, x_min..x_max, (y_min..y_max).log_scale(), points, &|v| {
                format!("{:.0e}", v)
            })?,
            YScale::Linear => self.draw_curves(&root, chart, x_min..x_max, y_min..y_max, points, &|v| {
                format!("{:.2e}", v)
            })?,
        }

        root.present()?;
        Ok(())
    }

    /// Mesh, curves and legend on a y axis of any scale.
    fn draw_curves<Y>(
        &self,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        chart: &ChartSpec,
        x_spec: Range<f64>,
        y_spec: Y,
        points: Vec<Vec<(f64, f64)>>,
        y_format: &dyn Fn(&f64) -> String,
    ) -> Result<()>
    where
        Y: AsRangedCoord<Value = f64>,
        Y::CoordDescType: ValueFormatter<f64>,
    {
        let label_area = if self.has_font { 70 } else { 0 };
        let mut ctx = ChartBuilder::on(root)
            .margin(30)
            .set_label_area_size(LabelAreaPosition::Left, label_area + 20)
            .set_label_area_size(LabelAreaPosition::Bottom, label_area)
            .build_cartesian_2d(x_spec, y_spec)?;

        {
            let mut mesh = ctx.configure_mesh();
            if self.has_font {
                mesh.x_desc(chart.x_label).y_desc(chart.kind.y_label()).y_label_formatter(y_format);
            } else {
                mesh.x_labels(0).y_labels(0);
            }
            mesh.draw()?;
        }

        for (i, (curve, series)) in chart.curves.iter().zip(points).enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let drawn = ctx.draw_series(LineSeries::new(series, color.stroke_width(2)))?;
            if self.has_font {
                drawn
                    .label(curve.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }
        }

        if self.has_font {
            ctx.configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .position(SeriesLabelPosition::UpperRight)
                .draw()?;
        }
        Ok(())
    }
}

impl PlotRenderer for PngRenderer {
    fn render(&self, chart: &ChartSpec, path: &Path) -> Result<()> {
        self.draw(chart, path).with_context(|| format!("Failed to render {}", path.display()))
    }
}

/// Register a font for chart text, trying the configured path first.
fn load_font(configured: Option<&Path>) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path.to_path_buf()],
        None => FALLBACK_FONTS.iter().map(PathBuf::from).collect(),
    };
    for candidate in candidates {
        let Ok(bytes) = fs::read(&candidate) else {
            continue;
        };
        // Fonts are registered for the lifetime of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        register_font(FontFamily::SansSerif.as_str(), FontStyle::Normal, bytes)
            .map_err(|_| anyhow!("{} is not a usable font", candidate.display()))?;
        return Ok(candidate);
    }
    Err(anyhow!("no font found (set `font` in the configuration)"))
}

/// Data range of the x axis, widened when all samples coincide.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.5 };
        return (min - pad, max + pad);
    }
    (min, max)
}

/// Data range of the y axis; on a log axis the bounds are widened to whole decades.
fn y_range(values: impl Iterator<Item = f64>, scale: YScale) -> (f64, f64) {
    let (min, max) = padded_range(values);
    match scale {
        YScale::Linear => (min, max),
        YScale::Log => {
            if min <= 0.0 {
                return (1e-10, 1.0);
            }
            (10f64.powf(min.log10().floor()), 10f64.powf(max.log10().ceil()))
        }
    }
}
