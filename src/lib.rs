//! Multi-level Louvain community detection on weighted directed graphs,
//! parameterized over the quality measure being optimized.
//!
//! Three measures ship with the crate: [`EdgeRatio`], directed
//! [`Modularity`] and [`ModularityDensity`]. Anything implementing
//! [`QualityMeasure`] can be plugged into [`Louvain`].

pub mod community_search;
pub mod error;
pub mod moving;
pub mod network;
pub mod quality;

pub use community_search::louvain::{Louvain, LouvainConfig, LouvainLevels};
pub use error::{ClusteringError, Result};
pub use network::Network;
pub use network::builder::{LabeledNetwork, NetworkBuilder};
pub use network::grouping::{
    Clustering, Community, NetworkGrouping, Partition, partition_to_labels, validate_partition,
};
pub use quality::{EdgeRatio, Modularity, ModularityDensity, QualityFunction, QualityMeasure};
