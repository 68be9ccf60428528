//! Scoped temporary upload
//!
//! The uploaded file is deleted when the guard drops, on every exit path of
//! an import run (success, early `?` return, or panic unwind).

use crate::error::{ImportError, ImportResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Owns an uploaded file for the duration of one run
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Take ownership of a file already in the uploads area
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Copy `source` into `uploads_dir` under a unique name
    ///
    /// The original extension is kept so the sheet reader can pick a format.
    pub fn stage(source: &Path, uploads_dir: &Path) -> ImportResult<Self> {
        if !source.is_file() {
            return Err(ImportError::validation(format!(
                "Upload file not found: {}",
                source.display()
            )));
        }

        std::fs::create_dir_all(uploads_dir)?;

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let staged = uploads_dir.join(format!("{}-{}", Uuid::new_v4(), file_name));

        std::fs::copy(source, &staged)?;
        tracing::debug!(source = %source.display(), staged = %staged.display(), "Staged upload");

        Ok(Self::new(staged))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed temp upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove temp upload"
            ),
        }
    }
}
