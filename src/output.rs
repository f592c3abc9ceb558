use crate::core::{Clusters, ItemRegistry};
use std::io::{self, Write};
use std::path::Path;

/// Print each group as a block of paths followed by a blank line.
///
/// Groups come out newest first. Ids whose registry slot is empty are
/// skipped. Paths are written as their raw bytes where the platform allows,
/// so names that are not valid UTF-8 come out unchanged. Returns the number
/// of groups written.
pub fn write_groups<W: Write>(
    writer: &mut W,
    registry: &ItemRegistry,
    clusters: &Clusters,
) -> io::Result<usize> {
    let mut written = 0;
    for group in clusters.newest_first() {
        for path in group.ids().iter().filter_map(|&id| registry.get(id)) {
            write_path(writer, path)?;
        }
        writeln!(writer)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(unix)]
fn write_path<W: Write>(writer: &mut W, path: &Path) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;

    writer.write_all(path.as_os_str().as_bytes())?;
    writer.write_all(b"\n")
}

#[cfg(not(unix))]
fn write_path<W: Write>(writer: &mut W, path: &Path) -> io::Result<()> {
    writeln!(writer, "{}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tolerance;
    use crate::core::ClusteringEngine;
    use crate::index::{IndexError, Match, SearchResult, SearchThresholds, SimilarityIndex};

    /// Links every odd id with the id after it.
    struct PairIndex;

    impl SimilarityIndex for PairIndex {
        fn add_record(&mut self, _id: usize, _path: &Path) -> Result<(), IndexError> {
            Ok(())
        }

        fn delete_record(&mut self, _id: usize) {}

        fn search(
            &self,
            id: usize,
            _thresholds: &SearchThresholds,
        ) -> Result<SearchResult, IndexError> {
            let matches = if id % 2 == 1 {
                vec![Match {
                    id: id + 1,
                    distance: 0.0,
                }]
            } else {
                Vec::new()
            };
            Ok(SearchResult { matches })
        }
    }

    fn registry_of(names: &[&str]) -> ItemRegistry {
        let mut registry = ItemRegistry::new();
        for name in names {
            registry.append(name).unwrap();
        }
        registry
    }

    #[test]
    fn test_write_groups_newest_first() {
        let registry = registry_of(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]);
        let clusters = ClusteringEngine::new(Tolerance::default()).run(&registry, &PairIndex);

        let mut out = Vec::new();
        let written = write_groups(&mut out, &registry, &clusters).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "c.jpg\nd.jpg\n\na.jpg\nb.jpg\n\n"
        );
    }

    #[test]
    fn test_write_nothing_without_groups() {
        let registry = registry_of(&["a.jpg"]);
        let clusters = Clusters::default();

        let mut out = Vec::new();
        let written = write_groups(&mut out, &registry, &clusters).unwrap();

        assert_eq!(written, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_skips_missing_paths() {
        let mut registry = registry_of(&["a.jpg", "b.jpg", "c.jpg"]);
        let clusters = ClusteringEngine::new(Tolerance::default()).run(&registry, &PairIndex);
        registry.delete(2);

        let mut out = Vec::new();
        write_groups(&mut out, &registry, &clusters).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a.jpg\n\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_raw_path_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut registry = ItemRegistry::new();
        registry.append(OsStr::from_bytes(b"a\xff.jpg")).unwrap();
        registry.append("b.jpg").unwrap();
        registry.append("c.jpg").unwrap();
        let clusters = ClusteringEngine::new(Tolerance::default()).run(&registry, &PairIndex);

        let mut out = Vec::new();
        write_groups(&mut out, &registry, &clusters).unwrap();
        assert_eq!(out, b"a\xff.jpg\nb.jpg\n\n".to_vec());
    }
}
