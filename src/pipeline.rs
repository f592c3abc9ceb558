use crate::config::{Config, REGISTRY_CAPACITY};
use crate::core::registry::RegistryError;
use crate::core::sampler::SampleSummary;
use crate::core::scanner::{ScanError, ScanSummary};
use crate::core::{ClusteringEngine, Clusters, ItemRegistry, Sampler, Scanner};
use crate::index::{FingerprintIndex, IndexError, OpenMode};
use crate::progress;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Can't resolve given path {path}: {source}")]
    ResolveRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Can't create filelist: {0}")]
    Registry(#[from] RegistryError),

    #[error("Scan aborted: {0}")]
    Scan(#[from] ScanError),

    #[error("Can't create temporary index: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("Can't open temporary index: {0}")]
    Index(#[from] IndexError),
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct Report {
    pub root: PathBuf,
    pub registry: ItemRegistry,
    pub clusters: Clusters,
    pub scan: ScanSummary,
    pub samples: SampleSummary,
}

/// Scan `config.root`, fingerprint every image and group similar ones.
///
/// The fingerprint index lives in a temporary directory that is removed
/// before returning, whatever the outcome.
pub fn run(config: &Config) -> Result<Report, PipelineError> {
    let root = fs::canonicalize(&config.root).map_err(|source| PipelineError::ResolveRoot {
        path: config.root.clone(),
        source,
    })?;
    let show_progress = config.verbosity.shows_progress();

    let mut registry = ItemRegistry::with_capacity(REGISTRY_CAPACITY)?;

    info!("Scanning for images in {}", root.display());
    let scan = Scanner::new()
        .with_progress(progress::spinner("scanning for images", show_progress))
        .scan(&root, &mut registry)?;
    info!("Found {} images after initial scan", scan.images_found);

    let temp_dir = tempfile::Builder::new()
        .prefix("simdb-")
        .tempdir()
        .map_err(PipelineError::TempDir)?;
    let location = temp_dir.path().join("index");
    FingerprintIndex::create(&location)?;
    let mut index = FingerprintIndex::open(&location, OpenMode::ReadWrite)?;

    let samples = Sampler::new()
        .with_progress(progress::bar(
            registry.live_count() as u64,
            "making samples",
            show_progress,
        ))
        .sample(&mut registry, &mut index);

    let clusters = ClusteringEngine::new(config.tolerance)
        .with_progress(progress::bar(
            registry.size() as u64,
            "grouping images",
            show_progress,
        ))
        .run(&registry, &index);
    if clusters.is_truncated() {
        warn!("Grouping stopped early, results are partial");
    }

    if let Err(e) = index.close() {
        warn!("Can't close temporary index: {}", e);
    }
    if let Err(e) = temp_dir.close() {
        warn!("Can't remove temporary index: {}", e);
    }

    Ok(Report {
        root,
        registry,
        clusters,
        scan,
        samples,
    })
}
