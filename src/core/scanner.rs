use crate::core::registry::{ItemRegistry, RegistryError};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Can't add file to queue: {source}")]
    Registry {
        path: PathBuf,
        #[source]
        source: RegistryError,
    },
}

/// Counters collected during one directory walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub files_seen: usize,
    pub images_found: usize,
    pub entries_skipped: usize,
}

/// Walks a directory tree and queues every image file into a registry.
///
/// Files are recognised by content, so a mislabelled extension does not
/// matter.
pub struct Scanner {
    classifier: infer::Infer,
    progress: ProgressBar,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            classifier: infer::Infer::new(),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Whether the file at `path` holds image data.
    pub fn is_image(&self, path: &Path) -> std::io::Result<bool> {
        Ok(self
            .classifier
            .get_from_path(path)?
            .is_some_and(|kind| kind.mime_type().starts_with("image/")))
    }

    /// Append every image under `root` to `registry`.
    ///
    /// Unreadable entries are reported and skipped. Running out of memory in
    /// the registry stops the walk, since the remaining files would be lost.
    pub fn scan(&self, root: &Path, registry: &mut ItemRegistry) -> Result<ScanSummary, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::InvalidPath {
                path: format!("{} is not a directory", root.display()),
            });
        }

        let mut summary = ScanSummary::default();

        for entry in WalkDir::new(root).follow_links(false) {
            self.progress.tick();

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    warn!("Can't read: {} ({})", path, e);
                    summary.entries_skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            summary.files_seen += 1;

            let path = entry.path();
            match self.is_image(path) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!("Can't detect mimetype of file {}: {}", path.display(), e);
                    summary.entries_skipped += 1;
                    continue;
                }
            }

            debug!("Found image file: {}", path.display());
            registry
                .append(path)
                .map_err(|source| ScanError::Registry {
                    path: path.to_path_buf(),
                    source,
                })?;
            summary.images_found += 1;
        }

        self.progress.finish_and_clear();
        Ok(summary)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
