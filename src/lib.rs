//! Group visually similar images found under a directory tree.
//!
//! The crate is organised around a single pass:
//! - [`crate::core::Scanner`] walks the tree and queues image files into an
//!   [`crate::core::ItemRegistry`]
//! - [`crate::core::Sampler`] fingerprints every queued item into a
//!   [`index::SimilarityIndex`]
//! - [`crate::core::ClusteringEngine`] turns similarity searches into groups
//! - [`output::write_groups`] prints the result
//!
//! [`pipeline::run`] wires these together.

pub mod config;
pub mod core;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod progress;

pub use config::{Config, Tolerance, Verbosity};
pub use pipeline::{run, PipelineError, Report};
