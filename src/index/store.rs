use super::{
    Fingerprint, Fingerprinter, IndexError, Match, OpenMode, SearchResult, SearchThresholds,
    SimilarityIndex,
};
use crate::core::registry::ItemId;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File holding the records inside an index location.
pub const RECORDS_FILE: &str = "fingerprints.json";

/// Fingerprint records persisted as JSON under a directory.
///
/// Records live in memory while the index is open and are written back by
/// [`FingerprintIndex::close`] when the index was opened for writing.
pub struct FingerprintIndex {
    location: PathBuf,
    mode: OpenMode,
    records: BTreeMap<ItemId, Fingerprint>,
    fingerprinter: Fingerprinter,
    dirty: bool,
}

impl FingerprintIndex {
    /// Initialise an empty index at `location`.
    pub fn create(location: &Path) -> Result<(), IndexError> {
        fs::create_dir_all(location)?;

        let records_path = location.join(RECORDS_FILE);
        if records_path.exists() {
            return Err(IndexError::AlreadyExists { path: records_path });
        }

        let empty: BTreeMap<ItemId, Fingerprint> = BTreeMap::new();
        write_records(&records_path, &empty)
    }

    pub fn open(location: &Path, mode: OpenMode) -> Result<Self, IndexError> {
        let file = File::open(location.join(RECORDS_FILE))?;
        let records = serde_json::from_reader(BufReader::new(file))?;

        Ok(Self {
            location: location.to_path_buf(),
            mode,
            records,
            fingerprinter: Fingerprinter::new(),
            dirty: false,
        })
    }

    /// Flush pending writes and drop the handle.
    pub fn close(self) -> Result<(), IndexError> {
        if self.mode == OpenMode::ReadWrite && self.dirty {
            write_records(&self.location.join(RECORDS_FILE), &self.records)?;
        }
        Ok(())
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Fingerprint> {
        self.records.get(&id)
    }

    /// Store a precomputed fingerprint, replacing any previous record.
    pub fn insert(&mut self, id: ItemId, fingerprint: Fingerprint) -> Result<(), IndexError> {
        self.ensure_writable()?;
        self.records.insert(id, fingerprint);
        self.dirty = true;
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), IndexError> {
        match self.mode {
            OpenMode::ReadWrite => Ok(()),
            OpenMode::ReadOnly => Err(IndexError::ReadOnly),
        }
    }
}

impl SimilarityIndex for FingerprintIndex {
    fn add_record(&mut self, id: ItemId, path: &Path) -> Result<(), IndexError> {
        self.ensure_writable()?;
        let fingerprint = self.fingerprinter.compute(path)?;
        self.insert(id, fingerprint)
    }

    /// Decoding runs in parallel; records are committed in input order.
    fn add_records(&mut self, batch: &[(ItemId, &Path)]) -> Vec<(ItemId, Result<(), IndexError>)> {
        if self.mode == OpenMode::ReadOnly {
            return batch
                .iter()
                .map(|(id, _)| (*id, Err(IndexError::ReadOnly)))
                .collect();
        }

        let fingerprinter = &self.fingerprinter;
        let computed: Vec<(ItemId, Result<Fingerprint, IndexError>)> = batch
            .par_iter()
            .map(|(id, path)| (*id, fingerprinter.compute(path)))
            .collect();

        computed
            .into_iter()
            .map(|(id, fingerprint)| (id, fingerprint.and_then(|fp| self.insert(id, fp))))
            .collect()
    }

    fn delete_record(&mut self, id: ItemId) {
        if self.mode == OpenMode::ReadOnly {
            return;
        }
        if self.records.remove(&id).is_some() {
            self.dirty = true;
        }
    }

    fn search(
        &self,
        id: ItemId,
        thresholds: &SearchThresholds,
    ) -> Result<SearchResult, IndexError> {
        let needle = self
            .records
            .get(&id)
            .ok_or(IndexError::MissingRecord { id })?;

        let mut matches: Vec<Match> = self
            .records
            .iter()
            .filter(|(other_id, _)| **other_id != id)
            .filter_map(|(other_id, other)| {
                if needle.ratio_difference(other) > thresholds.ratio {
                    return None;
                }
                let distance = needle.bitmap_difference(other);
                (distance <= thresholds.bitmap).then_some(Match {
                    id: *other_id,
                    distance,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        Ok(SearchResult { matches })
    }
}

fn write_records(path: &Path, records: &BTreeMap<ItemId, Fingerprint>) -> Result<(), IndexError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}
