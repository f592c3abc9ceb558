// Similarity index consumed by the clustering engine.
// The engine only sees the `SimilarityIndex` trait; `FingerprintIndex` is the
// bundled implementation backed by perceptual hashes.

pub mod fingerprint;
pub mod store;

use crate::core::registry::ItemId;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use fingerprint::{Fingerprint, Fingerprinter};
pub use store::FingerprintIndex;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("Index already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("Index is opened read-only")]
    ReadOnly,

    #[error("No record for item #{id}")]
    MissingRecord { id: ItemId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// Maximum fractional differences for two records to count as similar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchThresholds {
    /// Allowed relative difference of aspect ratios
    pub ratio: f32,
    /// Allowed share of differing bitmap bits
    pub bitmap: f32,
}

impl SearchThresholds {
    /// Both thresholds set to `percent / 100`.
    pub fn from_percent(percent: u8) -> Self {
        let fraction = f32::from(percent) / 100.0;
        Self {
            ratio: fraction,
            bitmap: fraction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub id: ItemId,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub matches: Vec<Match>,
}

impl SearchResult {
    pub fn found(&self) -> usize {
        self.matches.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.matches.iter().map(|m| m.id)
    }
}

/// Fingerprint storage and nearest-neighbour search keyed by item id.
pub trait SimilarityIndex {
    /// Compute and store the fingerprint of the image at `path`.
    fn add_record(&mut self, id: ItemId, path: &Path) -> Result<(), IndexError>;

    /// Add several records, reporting one result per item in input order.
    fn add_records(&mut self, batch: &[(ItemId, &Path)]) -> Vec<(ItemId, Result<(), IndexError>)> {
        batch
            .iter()
            .map(|(id, path)| (*id, self.add_record(*id, path)))
            .collect()
    }

    fn delete_record(&mut self, id: ItemId);

    /// Records similar to `id`, excluding `id` itself.
    fn search(&self, id: ItemId, thresholds: &SearchThresholds)
        -> Result<SearchResult, IndexError>;
}
