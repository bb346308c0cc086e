//! Smoothing strategies applied to plotted curves.
//!
//! Smoothing only changes what is drawn; the exported table always holds the
//! aligned values.

use clap::ValueEnum;
use lowess::prelude::{Batch, Lowess as LowessModel};
use serde::Deserialize;

/// A length-preserving transform of one series.
pub trait Smoother {
    fn smooth(&self, values: &[f64]) -> Vec<f64>;
}

/// Available smoothing strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingMethod {
    /// Plot the aligned values as they are.
    #[serde(rename = "none")]
    #[value(name = "none")]
    Identity,
    /// 1D Gaussian filter with kernel width `sigma` (in samples).
    Gaussian,
    /// Locally weighted linear regression over a `frac` share of the samples.
    #[default]
    Lowess,
}

/// Passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Smoother for Identity {
    fn smooth(&self, values: &[f64]) -> Vec<f64> {
        values.to_vec()
    }
}

/// Gaussian filter with reflected edges, kernel truncated at four standard deviations.
///
/// The kernel never reaches further than the series is long.
#[derive(Debug, Clone, Copy)]
pub struct Gaussian {
    pub sigma: f64,
}

impl Gaussian {
    const TRUNCATE: f64 = 4.0;

    fn kernel(&self, len: usize) -> Vec<f64> {
        // Float to int casts saturate, so a huge sigma ends up at `len`
        let radius = ((Self::TRUNCATE * self.sigma + 0.5) as usize).min(len);
        let weights: Vec<f64> = (0..=2 * radius)
            .map(|i| {
                let x = i as f64 - radius as f64;
                (-0.5 * x * x / (self.sigma * self.sigma)).exp()
            })
            .collect();
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / total).collect()
    }
}

impl Smoother for Gaussian {
    fn smooth(&self, values: &[f64]) -> Vec<f64> {
        if values.is_empty() || !(self.sigma.is_finite() && self.sigma > 0.0) {
            return values.to_vec();
        }
        let kernel = self.kernel(values.len());
        let radius = (kernel.len() / 2) as isize;
        (0..values.len() as isize)
            .map(|i| {
                kernel
                    .iter()
                    .enumerate()
                    .map(|(j, w)| w * values[reflect(i + j as isize - radius, values.len())])
                    .sum::<f64>()
            })
            .collect()
    }
}

/// Map an out-of-range index back into `0..len` by mirroring about the edges (`d c b a | a b c d | d c b a`).
fn reflect(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let i = index.rem_euclid(period);
    if i < len as isize { i as usize } else { (period - 1 - i) as usize }
}

/// LOWESS over the sample index with three bisquare robustness iterations.
#[derive(Debug, Clone, Copy)]
pub struct Lowess {
    pub frac: f64,
}

impl Smoother for Lowess {
    fn smooth(&self, values: &[f64]) -> Vec<f64> {
        if values.len() < 3 {
            return values.to_vec();
        }
        let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        let fitted = LowessModel::new()
            .fraction(self.frac)
            .iterations(3)
            .adapter(Batch)
            .build()
            .and_then(|model| model.fit(&x, values));
        match fitted {
            Ok(result) => result.y,
            Err(e) => {
                log::warn!("LOWESS fit failed, plotting unsmoothed values: {}", e);
                values.to_vec()
            }
        }
    }
}

/// Smoothing settings as read from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SmoothingConfig {
    pub method: SmoothingMethod,
    /// Gaussian kernel width in samples.
    pub sigma: f64,
    /// Share of samples in each LOWESS neighbourhood.
    pub frac: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            method: SmoothingMethod::Lowess,
            sigma: 2.0,
            frac: 0.1,
        }
    }
}

impl SmoothingConfig {
    /// Build the strategy the exporter applies to every plotted series.
    pub fn build(&self) -> Box<dyn Smoother> {
        match self.method {
            SmoothingMethod::Identity => Box::new(Identity),
            SmoothingMethod::Gaussian => Box::new(Gaussian { sigma: self.sigma }),
            SmoothingMethod::Lowess => Box::new(Lowess { frac: self.frac }),
        }
    }

    /// Reject parameters the smoothers cannot work with.
    ///
    /// `sigma` must be finite and positive, `frac` must lie in `(0, 1]`.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(format!("smoothing sigma must be a positive number, got {}", self.sigma));
        }
        if !(self.frac > 0.0 && self.frac <= 1.0) {
            return Err(format!("smoothing frac must be in (0, 1], got {}", self.frac));
        }
        Ok(())
    }
}
