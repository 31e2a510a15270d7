use crate::network::Network;
use crate::network::grouping::{NetworkGrouping, Partition};
use single_utilities::traits::FloatOpsTS;

/// Original-level node ids represented by each node of a (possibly coarsened) network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupernodeMembers {
    members: Vec<Vec<usize>>,
}

impl SupernodeMembers {
    /// Level-0 membership: every node stands for itself.
    pub fn identity(node_count: usize) -> Self {
        Self {
            members: (0..node_count).map(|node| vec![node]).collect(),
        }
    }

    #[inline]
    pub fn get(&self, supernode: usize) -> &[usize] {
        &self.members[supernode]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Translates communities of supernodes into sorted communities of original nodes.
    pub fn expand(&self, inner_partition: &[Vec<usize>]) -> Partition {
        inner_partition
            .iter()
            .map(|community| {
                let mut nodes: Vec<usize> = community
                    .iter()
                    .flat_map(|&supernode| self.members[supernode].iter().copied())
                    .collect();
                nodes.sort_unstable();
                nodes
            })
            .collect()
    }

    /// Membership of the next level, one entry per group of `grouping`.
    pub fn reduce<G: NetworkGrouping>(&self, grouping: &G) -> Self {
        let mut members = vec![Vec::new(); grouping.group_count()];
        for supernode in 0..grouping.node_count() {
            members[grouping.get_group(supernode)].extend_from_slice(&self.members[supernode]);
        }
        for nodes in members.iter_mut() {
            nodes.sort_unstable();
        }
        Self { members }
    }
}

/// Output of one coarsening step.
#[derive(Debug, Clone)]
pub struct ReducedNetwork<T> {
    pub network: Network<T>,
    pub members: SupernodeMembers,
}

/// Collapses every community of `grouping` into a supernode.
///
/// `grouping` must be normalized (no empty groups), as the local moving phase
/// leaves it.
pub fn aggregate<T, G>(network: &Network<T>, members: &SupernodeMembers, grouping: &G) -> ReducedNetwork<T>
where
    T: FloatOpsTS + 'static,
    G: NetworkGrouping,
{
    debug_assert_eq!(network.node_count(), members.len());
    debug_assert!(
        grouping.get_group_members().iter().all(|m| !m.is_empty()),
        "aggregation requires a normalized grouping"
    );

    ReducedNetwork {
        network: network.create_reduced_network(grouping),
        members: members.reduce(grouping),
    }
}
