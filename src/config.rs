//! Run configuration loaded from an optional TOML file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analyzer::MalformedPolicy;
use crate::export::{ExportOptions, SmoothingConfig, YScale};

/// Settings for one evaluation run. Every key is optional.
///
/// ```toml
/// output-prefix = "cavity"
/// y-scale = "log"
/// strict = false
///
/// [smoothing]
/// method = "gaussian"
/// sigma = 3.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunConfig {
    /// File name prefix of every artifact
    pub output_prefix: String,
    /// Directory the artifacts are written to
    pub output_dir: PathBuf,
    pub smoothing: SmoothingConfig,
    pub y_scale: YScale,
    /// Abort on the first malformed numeric record instead of skipping it
    pub strict: bool,
    pub plot_width: u32,
    pub plot_height: u32,
    /// TrueType/OpenType font for chart text
    pub font: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_prefix: "output".to_string(),
            output_dir: PathBuf::from("."),
            smoothing: SmoothingConfig::default(),
            y_scale: YScale::Log,
            strict: false,
            plot_width: 1920,
            plot_height: 1440,
            font: None,
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the config file
    ///
    /// # Returns
    /// * `Ok(RunConfig)` if the file was successfully loaded and parsed
    /// * `Err(String)` with a descriptive error message otherwise
    pub fn load(config_path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file {}: {}", config_path.display(), e))?;

        let config = Self::parse(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", config_path.display(), e))?;
        config
            .validate()
            .map_err(|e| format!("Invalid config file {}: {}", config_path.display(), e))?;
        Ok(config)
    }

    /// Check value ranges that the TOML types alone do not enforce.
    pub fn validate(&self) -> Result<(), String> {
        self.smoothing.validate()?;
        if self.plot_width == 0 || self.plot_height == 0 {
            return Err(format!("plot size must be non-zero, got {}x{}", self.plot_width, self.plot_height));
        }
        Ok(())
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn malformed_policy(&self) -> MalformedPolicy {
        if self.strict { MalformedPolicy::Fail } else { MalformedPolicy::Skip }
    }

    pub fn plot_size(&self) -> (u32, u32) {
        (self.plot_width, self.plot_height)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            output_dir: self.output_dir.clone(),
            prefix: self.output_prefix.clone(),
            scale: self.y_scale,
        }
    }
}
