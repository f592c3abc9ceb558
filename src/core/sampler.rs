use crate::core::registry::{ItemId, ItemRegistry};
use crate::index::SimilarityIndex;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Items handed to the index per call.
pub const BATCH_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleSummary {
    pub sampled: usize,
    pub rejected: usize,
}

/// Submits every registered item to the index once.
///
/// Items the index rejects are dropped from both the index and the registry,
/// so clustering only ever sees ids that have a fingerprint.
pub struct Sampler {
    progress: ProgressBar,
}

impl Sampler {
    pub fn new() -> Self {
        Self {
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn sample<I>(&self, registry: &mut ItemRegistry, index: &mut I) -> SampleSummary
    where
        I: SimilarityIndex + ?Sized,
    {
        let pending: Vec<(ItemId, PathBuf)> = registry
            .iter()
            .map(|(id, path)| (id, path.to_path_buf()))
            .collect();

        self.progress.set_length(pending.len() as u64);
        let mut summary = SampleSummary::default();

        for chunk in pending.chunks(BATCH_SIZE) {
            let batch: Vec<(ItemId, &Path)> = chunk
                .iter()
                .map(|(id, path)| (*id, path.as_path()))
                .collect();

            for (id, result) in index.add_records(&batch) {
                match result {
                    Ok(()) => summary.sampled += 1,
                    Err(e) => {
                        warn!(
                            "Can't add file #{} '{}' -- {}",
                            id,
                            registry.get(id).unwrap_or(Path::new("")).display(),
                            e
                        );
                        index.delete_record(id);
                        registry.delete(id);
                        summary.rejected += 1;
                    }
                }
            }

            self.progress.inc(chunk.len() as u64);
        }

        self.progress.finish_and_clear();
        info!(
            "Sampled {} image(s), {} rejected",
            summary.sampled, summary.rejected
        );
        summary
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexError, SearchResult, SearchThresholds};
    use std::collections::BTreeSet;

    /// Accepts every path except those containing "broken".
    #[derive(Default)]
    struct PickyIndex {
        records: BTreeSet<ItemId>,
        deleted: Vec<ItemId>,
    }

    impl SimilarityIndex for PickyIndex {
        fn add_record(&mut self, id: ItemId, path: &Path) -> Result<(), IndexError> {
            if path.to_string_lossy().contains("broken") {
                return Err(IndexError::InvalidImage {
                    reason: "corrupt data".to_string(),
                });
            }
            self.records.insert(id);
            Ok(())
        }

        fn delete_record(&mut self, id: ItemId) {
            self.records.remove(&id);
            self.deleted.push(id);
        }

        fn search(
            &self,
            _id: ItemId,
            _thresholds: &SearchThresholds,
        ) -> Result<SearchResult, IndexError> {
            Ok(SearchResult::default())
        }
    }

    #[test]
    fn test_sample_all_good() {
        let mut registry = ItemRegistry::new();
        registry.append("a.png").unwrap();
        registry.append("b.png").unwrap();

        let mut index = PickyIndex::default();
        let summary = Sampler::new().sample(&mut registry, &mut index);

        assert_eq!(summary, SampleSummary { sampled: 2, rejected: 0 });
        assert_eq!(index.records.len(), 2);
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_rejected_items_are_tombstoned() {
        let mut registry = ItemRegistry::new();
        registry.append("a.png").unwrap();
        registry.append("broken.png").unwrap();
        registry.append("c.png").unwrap();

        let mut index = PickyIndex::default();
        let summary = Sampler::new().sample(&mut registry, &mut index);

        assert_eq!(summary, SampleSummary { sampled: 2, rejected: 1 });
        assert_eq!(registry.size(), 3);
        assert_eq!(registry.get(2), None);
        assert_eq!(index.deleted, vec![2]);
        assert!(!index.records.contains(&2));
    }

    #[test]
    fn test_rejected_trailing_item_shrinks_registry() {
        let mut registry = ItemRegistry::new();
        registry.append("a.png").unwrap();
        registry.append("broken.png").unwrap();

        let mut index = PickyIndex::default();
        Sampler::new().sample(&mut registry, &mut index);

        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_skips_tombstoned_slots() {
        let mut registry = ItemRegistry::new();
        registry.append("a.png").unwrap();
        registry.append("b.png").unwrap();
        registry.append("c.png").unwrap();
        registry.delete(2);

        let mut index = PickyIndex::default();
        let summary = Sampler::new().sample(&mut registry, &mut index);

        assert_eq!(summary.sampled, 2);
        assert_eq!(index.records.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_spans_multiple_batches() {
        let mut registry = ItemRegistry::new();
        for i in 0..(BATCH_SIZE * 2 + 5) {
            let name = if i % 10 == 0 {
                format!("broken_{}.png", i)
            } else {
                format!("{}.png", i)
            };
            registry.append(&name).unwrap();
        }

        let mut index = PickyIndex::default();
        let summary = Sampler::new().sample(&mut registry, &mut index);

        assert_eq!(summary.sampled + summary.rejected, BATCH_SIZE * 2 + 5);
        assert_eq!(summary.rejected, 14);
        assert_eq!(registry.live_count(), summary.sampled);
    }
}
