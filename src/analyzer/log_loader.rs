//! Loads a solver log into memory for the detection and parsing passes.
//!
//! Logs are read in one go; every later stage borrows the loaded content.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::AnalyzerError;

/// An in-memory copy of a solver log.
#[derive(Debug)]
pub struct LogLoader {
    path: PathBuf,
    content: String,
}

impl LogLoader {
    /// Read the whole log at `path`.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected, since
    /// solver banners occasionally carry locale-specific characters.
    ///
    /// # Returns
    ///
    /// `Ok(LogLoader)` if the file opens and reads, `Err(InputNotFound)` otherwise.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref().to_path_buf();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) => return Err(AnalyzerError::InputNotFound { path, source }),
        };

        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{} is not valid UTF-8; invalid bytes were replaced", path.display());
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        log::info!("Loaded {} ({} bytes)", path.display(), content.len());
        Ok(Self { path, content })
    }

    /// Wrap content that is already in memory.
    #[cfg(test)]
    pub fn from_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
