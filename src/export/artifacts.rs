//! Tracks files written during an export so a failed run leaves none behind.

use std::fs;
use std::path::{Path, PathBuf};

/// Removes every recorded file on drop unless the export was committed.
#[derive(Debug, Default)]
pub struct ArtifactGuard {
    written: Vec<PathBuf>,
    committed: bool,
}

impl ArtifactGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` before writing to it, so a half-written file is removed too.
    pub fn track(&mut self, path: &Path) {
        self.written.push(path.to_path_buf());
    }

    /// Keep the files and return their paths in write order.
    pub fn commit(mut self) -> Vec<PathBuf> {
        self.committed = true;
        std::mem::take(&mut self.written)
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for path in &self.written {
            match fs::remove_file(path) {
                Ok(()) => log::info!("Removed partial output {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to remove partial output {}: {}", path.display(), e),
            }
        }
    }
}
