use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusteringError>;

/// Errors raised while building networks or checking partitions handed in by callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusteringError {
    #[error("node {node} is out of range for a network with {node_count} nodes")]
    NodeOutOfRange { node: usize, node_count: usize },

    #[error("edge weight must be finite and non-negative, got {0}")]
    InvalidWeight(f64),

    #[error("node {0} appears in more than one community")]
    DuplicateNode(usize),

    #[error("node {0} is not covered by the partition")]
    MissingNode(usize),

    #[error("community id {group} is out of range for {node_count} nodes")]
    GroupOutOfRange { group: usize, node_count: usize },

    #[error("community {0} of the partition is empty")]
    EmptyCommunity(usize),

    #[error("unknown quality function: {0}")]
    UnknownQualityFunction(String),
}
