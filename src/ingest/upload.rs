// src/ingest/upload.rs
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;

/// An uploaded CSV body parked in a temporary file.
///
/// The file is removed when the value is released or dropped, so every exit
/// path of an ingestion (including an early `?` or a panic) cleans it up.
pub struct ScopedUpload {
    file: NamedTempFile,
}

impl ScopedUpload {
    /// Blocking; call from `spawn_blocking` inside async handlers.
    pub fn write_in(dir: &Path, bytes: &[u8]) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".csv")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!(path = %file.path().display(), size = bytes.len(), "stored upload");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, logging instead of failing if that is not possible.
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => debug!(path = %path.display(), "removed upload"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove upload"),
        }
    }
}
