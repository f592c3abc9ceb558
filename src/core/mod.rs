pub mod cluster;
pub mod group;
pub mod registry;
pub mod sampler;
pub mod scanner;

pub use cluster::{ClusteringEngine, Clusters, GroupAllocator, GroupIndex, HeapAllocator};
pub use group::Group;
pub use registry::{ItemId, ItemRegistry};
pub use sampler::Sampler;
pub use scanner::Scanner;
