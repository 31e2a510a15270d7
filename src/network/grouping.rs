use crate::error::{ClusteringError, Result};
use crate::network::Network;
use single_utilities::traits::FloatOpsTS;

pub type Community = Vec<usize>;

/// Ordered sequence of disjoint communities covering every node.
pub type Partition = Vec<Community>;

pub trait NetworkGrouping {
    /// Gets the group ID for a given node
    fn get_group(&self, node: usize) -> usize;

    /// Gets the total number of nodes
    fn node_count(&self) -> usize;

    /// Gets the total number of groups, empty ones included
    fn group_count(&self) -> usize;

    fn get_group_members(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.group_count()];
        for node in 0..self.node_count() {
            groups[self.get_group(node)].push(node);
        }
        groups
    }
}

/// Node-to-community assignment of one level together with the member list of
/// every community and the weight aggregates the quality measures read.
///
/// Members are stored position-indexed so that moving a node is O(1) on the
/// bookkeeping side and O(degree) for the aggregates.
#[derive(Debug, Clone)]
pub struct Clustering<T> {
    assignments: Vec<usize>,
    members: Vec<Vec<usize>>,
    positions: Vec<usize>,
    internal_weights: Vec<T>,
    internal_edge_counts: Vec<usize>,
    out_strengths: Vec<T>,
    in_strengths: Vec<T>,
}

impl<T> Clustering<T>
where
    T: FloatOpsTS + 'static,
{
    pub fn create_isolated(network: &Network<T>) -> Self {
        let node_count = network.node_count();
        Self {
            assignments: (0..node_count).collect(),
            members: (0..node_count).map(|node| vec![node]).collect(),
            positions: vec![0; node_count],
            internal_weights: (0..node_count)
                .map(|node| network.self_loop_weight(node))
                .collect(),
            internal_edge_counts: (0..node_count)
                .map(|node| usize::from(network.self_loop_weight(node) > T::zero()))
                .collect(),
            out_strengths: (0..node_count)
                .map(|node| network.out_strength(node))
                .collect(),
            in_strengths: (0..node_count)
                .map(|node| network.in_strength(node))
                .collect(),
        }
    }

    /// Builds a clustering from one community id per node. Ids need not be
    /// contiguous but must stay below the node count.
    pub fn from_assignments(network: &Network<T>, assignments: &[usize]) -> Result<Self> {
        let node_count = network.node_count();
        if assignments.len() < node_count {
            return Err(ClusteringError::MissingNode(assignments.len()));
        }
        if assignments.len() > node_count {
            return Err(ClusteringError::NodeOutOfRange {
                node: node_count,
                node_count,
            });
        }

        if let Some(&group) = assignments.iter().find(|&&group| group >= node_count) {
            return Err(ClusteringError::GroupOutOfRange { group, node_count });
        }

        let group_count = assignments.iter().max().map_or(0, |&max| max + 1);
        let mut members = vec![Vec::new(); group_count];
        let mut positions = vec![0; node_count];
        for (node, &group) in assignments.iter().enumerate() {
            positions[node] = members[group].len();
            members[group].push(node);
        }

        let mut clustering = Self {
            assignments: assignments.to_vec(),
            members,
            positions,
            internal_weights: vec![T::zero(); group_count],
            internal_edge_counts: vec![0; group_count],
            out_strengths: vec![T::zero(); group_count],
            in_strengths: vec![T::zero(); group_count],
        };
        clustering.recompute_aggregates(network);
        Ok(clustering)
    }

    /// Builds a clustering whose community `i` is `partition[i]`, after validating it.
    pub fn from_partition(network: &Network<T>, partition: &[Vec<usize>]) -> Result<Self> {
        let assignments = partition_to_labels(network.node_count(), partition)?;
        Self::from_assignments(network, &assignments)
    }

    fn recompute_aggregates(&mut self, network: &Network<T>) {
        self.internal_weights.fill(T::zero());
        self.internal_edge_counts.fill(0);
        self.out_strengths.fill(T::zero());
        self.in_strengths.fill(T::zero());

        for (source, target, weight) in network.edges() {
            let g1 = self.assignments[source];
            let g2 = self.assignments[target];
            self.out_strengths[g1] += weight;
            self.in_strengths[g2] += weight;
            if g1 == g2 {
                self.internal_weights[g1] += weight;
                if weight > T::zero() {
                    self.internal_edge_counts[g1] += 1;
                }
            }
        }
    }

    #[inline]
    pub fn members(&self, group: usize) -> &[usize] {
        &self.members[group]
    }

    #[inline]
    pub fn group_size(&self, group: usize) -> usize {
        self.members[group].len()
    }

    /// Weight of the directed edges with both endpoints in `group`, self-loops included.
    #[inline]
    pub fn internal_weight(&self, group: usize) -> T {
        self.internal_weights[group]
    }

    /// Number of positive-weight edges counted in `internal_weight`. Zero means
    /// the group has no internal weight, whatever rounding left in the sum.
    #[inline]
    pub fn internal_edge_count(&self, group: usize) -> usize {
        self.internal_edge_counts[group]
    }

    #[inline]
    pub fn out_strength(&self, group: usize) -> T {
        self.out_strengths[group]
    }

    #[inline]
    pub fn in_strength(&self, group: usize) -> T {
        self.in_strengths[group]
    }

    #[inline]
    pub fn volume(&self, group: usize) -> T {
        self.out_strengths[group] + self.in_strengths[group]
    }

    /// Moves `node` into `group`, keeping members and aggregates consistent.
    pub fn move_node(&mut self, network: &Network<T>, node: usize, group: usize) {
        let current = self.assignments[node];
        if current == group {
            return;
        }
        debug_assert!(group < self.members.len(), "Invalid group assignment");

        let (to_current, to_target) = network.links_to_two_comms(node, current, group, &*self);
        let self_loop = network.self_loop_weight(node);
        let self_loop_edges = usize::from(self_loop > T::zero());
        let out_strength = network.out_strength(node);
        let in_strength = network.in_strength(node);

        self.internal_weights[current] -= to_current.weight + self_loop;
        self.internal_edge_counts[current] -= to_current.edge_count + self_loop_edges;
        self.out_strengths[current] -= out_strength;
        self.in_strengths[current] -= in_strength;

        self.internal_weights[group] += to_target.weight + self_loop;
        self.internal_edge_counts[group] += to_target.edge_count + self_loop_edges;
        self.out_strengths[group] += out_strength;
        self.in_strengths[group] += in_strength;

        let position = self.positions[node];
        self.members[current].swap_remove(position);
        if let Some(&moved) = self.members[current].get(position) {
            self.positions[moved] = position;
        }
        if self.members[current].is_empty() {
            self.internal_weights[current] = T::zero();
            self.internal_edge_counts[current] = 0;
            self.out_strengths[current] = T::zero();
            self.in_strengths[current] = T::zero();
        }

        self.positions[node] = self.members[group].len();
        self.members[group].push(node);
        self.assignments[node] = group;
    }

    /// Renumbers groups to eliminate empty ones, keeping their relative order.
    /// Members of every group end up sorted.
    pub fn normalize_groups(&mut self) {
        let mut new_ids = Vec::with_capacity(self.members.len());
        let mut next_id = 0;
        for members in &self.members {
            if members.is_empty() {
                new_ids.push(usize::MAX);
            } else {
                new_ids.push(next_id);
                next_id += 1;
            }
        }

        let keep: Vec<bool> = self.members.iter().map(|m| !m.is_empty()).collect();
        let mut flags = keep.iter();
        self.members.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.internal_edge_counts
            .retain(|_| *flags.next().unwrap_or(&false));
        for aggregate in [
            &mut self.internal_weights,
            &mut self.out_strengths,
            &mut self.in_strengths,
        ] {
            let mut flags = keep.iter();
            aggregate.retain(|_| *flags.next().unwrap_or(&false));
        }

        for group in self.assignments.iter_mut() {
            let new_id = new_ids[*group];
            debug_assert!(new_id != usize::MAX, "Invalid group assignment");
            *group = new_id;
        }

        for members in self.members.iter_mut() {
            members.sort_unstable();
            for (position, &node) in members.iter().enumerate() {
                self.positions[node] = position;
            }
        }
    }

    /// Non-empty communities in group order, in terms of this level's node ids.
    pub fn inner_partition(&self) -> Partition {
        self.members
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| {
                let mut community = m.clone();
                community.sort_unstable();
                community
            })
            .collect()
    }

    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }
}

impl<T> NetworkGrouping for Clustering<T> {
    #[inline]
    fn get_group(&self, node: usize) -> usize {
        self.assignments[node]
    }

    #[inline]
    fn node_count(&self) -> usize {
        self.assignments.len()
    }

    #[inline]
    fn group_count(&self) -> usize {
        self.members.len()
    }

    fn get_group_members(&self) -> Vec<Vec<usize>> {
        self.members.clone()
    }
}

/// Checks that `partition` splits `0..node_count` into disjoint, non-empty communities.
pub fn validate_partition(node_count: usize, partition: &[Vec<usize>]) -> Result<()> {
    partition_to_labels(node_count, partition).map(|_| ())
}

/// One label per node: the index of the community holding it.
pub fn partition_to_labels(node_count: usize, partition: &[Vec<usize>]) -> Result<Vec<usize>> {
    let mut labels = vec![usize::MAX; node_count];
    for (community_id, community) in partition.iter().enumerate() {
        if community.is_empty() {
            return Err(ClusteringError::EmptyCommunity(community_id));
        }
        for &node in community {
            if node >= node_count {
                return Err(ClusteringError::NodeOutOfRange { node, node_count });
            }
            if labels[node] != usize::MAX {
                return Err(ClusteringError::DuplicateNode(node));
            }
            labels[node] = community_id;
        }
    }
    if let Some(node) = labels.iter().position(|&label| label == usize::MAX) {
        return Err(ClusteringError::MissingNode(node));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 <-> 1 -> 2 -> 3, 3 -> 3
    fn create_test_network() -> Network<f64> {
        Network::from_edges(
            4,
            &[
                (0, 1, 1.0),
                (1, 0, 1.0),
                (1, 2, 2.0),
                (2, 3, 1.0),
                (3, 3, 0.5),
            ],
        )
        .unwrap()
    }

    fn assert_aggregates_match(clustering: &Clustering<f64>, network: &Network<f64>) {
        let fresh = Clustering::from_assignments(network, clustering.assignments()).unwrap();
        for group in 0..clustering.group_count() {
            assert!((clustering.internal_weight(group) - fresh.internal_weight(group)).abs() < 1e-12);
            assert_eq!(clustering.internal_edge_count(group), fresh.internal_edge_count(group));
            assert!((clustering.out_strength(group) - fresh.out_strength(group)).abs() < 1e-12);
            assert!((clustering.in_strength(group) - fresh.in_strength(group)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_isolated_clustering() {
        let network = create_test_network();
        let clustering = Clustering::create_isolated(&network);
        assert_eq!(clustering.group_count(), 4);
        assert_eq!(clustering.internal_weight(3), 0.5);
        assert_eq!(clustering.internal_weight(0), 0.0);
        assert_eq!(clustering.volume(1), 4.0);
        assert_eq!(clustering.get_group_members(), vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_move_node_updates_aggregates() {
        let network = create_test_network();
        let mut clustering = Clustering::create_isolated(&network);

        clustering.move_node(&network, 0, 1);
        assert_eq!(clustering.get_group(0), 1);
        assert_eq!(clustering.group_size(0), 0);
        assert_eq!(clustering.internal_weight(1), 2.0);
        assert_eq!(clustering.out_strength(1), 4.0);
        assert_eq!(clustering.internal_weight(0), 0.0);
        assert_aggregates_match(&clustering, &network);

        clustering.move_node(&network, 2, 1);
        clustering.move_node(&network, 3, 1);
        assert_eq!(clustering.internal_weight(1), network.size());
        assert_aggregates_match(&clustering, &network);

        clustering.move_node(&network, 1, 0);
        assert_eq!(clustering.members(0), &[1]);
        assert_aggregates_match(&clustering, &network);
    }

    #[test]
    fn test_normalize_groups() {
        let network = create_test_network();
        let mut clustering = Clustering::create_isolated(&network);
        clustering.move_node(&network, 1, 3);
        clustering.move_node(&network, 0, 2);

        clustering.normalize_groups();
        assert_eq!(clustering.group_count(), 2);
        assert_eq!(clustering.assignments(), &[0, 1, 0, 1]);
        assert_eq!(clustering.members(0), &[0, 2]);
        assert_eq!(clustering.members(1), &[1, 3]);
        assert_aggregates_match(&clustering, &network);

        clustering.move_node(&network, 0, 1);
        assert_eq!(clustering.members(0), &[2]);
        assert_eq!(clustering.inner_partition(), vec![vec![2], vec![0, 1, 3]]);
    }

    #[test]
    fn test_from_assignments_with_gaps() {
        let network = create_test_network();
        let clustering = Clustering::from_assignments(&network, &[3, 3, 1, 1]).unwrap();
        assert_eq!(clustering.group_count(), 4);
        assert_eq!(clustering.inner_partition().len(), 2);
        assert_eq!(clustering.internal_weight(3), 2.0);
        assert_eq!(clustering.internal_edge_count(3), 2);
        assert_eq!(clustering.internal_weight(1), 1.5);
        assert_eq!(clustering.internal_edge_count(1), 2);
        assert_eq!(clustering.internal_edge_count(0), 0);
        assert_eq!(clustering.inner_partition(), vec![vec![2, 3], vec![0, 1]]);
    }

    #[test]
    fn test_from_assignments_rejects_large_ids() {
        let network = create_test_network();
        assert_eq!(
            Clustering::from_assignments(&network, &[0, usize::MAX, 1, 1]).unwrap_err(),
            ClusteringError::GroupOutOfRange {
                group: usize::MAX,
                node_count: 4
            }
        );
        assert!(Clustering::from_assignments(&network, &[0, 4, 1, 1]).is_err());
        assert!(Clustering::from_assignments(&network, &[0, 3, 1, 1]).is_ok());
    }

    #[test]
    fn test_internal_edge_counts_follow_moves() {
        let network = create_test_network();
        let mut clustering = Clustering::create_isolated(&network);
        assert_eq!(clustering.internal_edge_count(3), 1);

        clustering.move_node(&network, 0, 1);
        assert_eq!(clustering.internal_edge_count(1), 2);
        clustering.move_node(&network, 1, 2);
        clustering.move_node(&network, 0, 2);
        assert_eq!(clustering.internal_edge_count(1), 0);
        assert_eq!(clustering.internal_edge_count(2), 3);
        assert_eq!(clustering.internal_weight(2), 4.0);

        clustering.normalize_groups();
        assert_eq!(clustering.internal_edge_count(0), 3);
        assert_eq!(clustering.internal_edge_count(1), 1);
        assert_aggregates_match(&clustering, &network);
    }

    #[test]
    fn test_validate_partition() {
        assert!(validate_partition(4, &[vec![0, 3], vec![1, 2]]).is_ok());
        assert_eq!(
            validate_partition(4, &[vec![0, 3], vec![1, 3], vec![2]]),
            Err(ClusteringError::DuplicateNode(3))
        );
        assert_eq!(
            validate_partition(4, &[vec![0, 3], vec![1]]),
            Err(ClusteringError::MissingNode(2))
        );
        assert_eq!(
            validate_partition(4, &[vec![0, 1, 2, 3], vec![]]),
            Err(ClusteringError::EmptyCommunity(1))
        );
        assert_eq!(
            validate_partition(2, &[vec![0, 1, 7]]),
            Err(ClusteringError::NodeOutOfRange {
                node: 7,
                node_count: 2
            })
        );
        assert!(validate_partition(0, &[]).is_ok());
    }

    #[test]
    fn test_partition_to_labels() {
        let labels = partition_to_labels(5, &[vec![4, 0], vec![2], vec![1, 3]]).unwrap();
        assert_eq!(labels, vec![0, 2, 1, 2, 0]);
    }
}
