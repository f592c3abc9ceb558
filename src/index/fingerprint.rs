use super::IndexError;
use image::{DynamicImage, ImageReader};
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Side length of the mean-hash bitmap, in bits.
pub const HASH_SIZE: u32 = 16;

/// Compact description of an image used for similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Width divided by height
    pub ratio: f32,
    /// Mean-hash bits, row major
    pub bitmap: Vec<u8>,
}

impl Fingerprint {
    /// Relative difference between the two aspect ratios, in `[0, 1)`.
    pub fn ratio_difference(&self, other: &Fingerprint) -> f32 {
        let largest = self.ratio.max(other.ratio);
        if largest <= 0.0 {
            return 0.0;
        }
        (self.ratio - other.ratio).abs() / largest
    }

    /// Share of bitmap bits that differ, in `[0, 1]`.
    ///
    /// Bitmaps of different length are treated as completely different.
    pub fn bitmap_difference(&self, other: &Fingerprint) -> f32 {
        if self.bitmap.len() != other.bitmap.len() || self.bitmap.is_empty() {
            return 1.0;
        }

        let differing: u32 = self
            .bitmap
            .iter()
            .zip(&other.bitmap)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        differing as f32 / (self.bitmap.len() * 8) as f32
    }
}

/// Computes fingerprints from image files.
pub struct Fingerprinter {
    hasher: Hasher,
}

impl Fingerprinter {
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_size(HASH_SIZE, HASH_SIZE)
            .hash_alg(HashAlg::Mean)
            .to_hasher();
        Self { hasher }
    }

    /// Decode the file at `path` and fingerprint it.
    ///
    /// The format is detected from content, not from the extension.
    pub fn compute(&self, path: &Path) -> Result<Fingerprint, IndexError> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        self.fingerprint_image(&image)
    }

    pub fn fingerprint_image(&self, image: &DynamicImage) -> Result<Fingerprint, IndexError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(IndexError::InvalidImage {
                reason: format!("empty image {}x{}", width, height),
            });
        }

        let hash = self.hasher.hash_image(image);
        Ok(Fingerprint {
            ratio: width as f32 / height as f32,
            bitmap: hash.as_bytes().to_vec(),
        })
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}
