use crate::error::ClusteringError;
use crate::network::Network;
use crate::network::grouping::{Clustering, NetworkGrouping};
use num_traits::Float;
use single_utilities::traits::FloatOpsTS;
use std::fmt;
use std::str::FromStr;

mod edge_ratio;
pub use edge_ratio::EdgeRatio;
mod modularity;
pub use modularity::Modularity;
mod modularity_density;
pub use modularity_density::ModularityDensity;

/// A partition quality function the Louvain optimizer maximizes.
///
/// `global_score` must be a sum of independent per-community terms, and
/// `local_gain` must equal the change of `global_score` caused by moving a
/// single node, computed from that node's incident edges only.
pub trait QualityMeasure<T>: Send + Sync
where
    T: FloatOpsTS + 'static,
{
    /// Score of `partition` (communities of `network` node ids).
    fn global_score(&self, network: &Network<T>, partition: &[Vec<usize>], total_weight: T) -> T;

    /// Score delta of moving `node` from its current community into `target`.
    fn local_gain(
        &self,
        network: &Network<T>,
        node: usize,
        target: usize,
        clustering: &Clustering<T>,
        total_weight: T,
    ) -> T;
}

/// Weight aggregates of one community.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommunityStats<T> {
    pub internal_weight: T,
    /// Positive-weight edges behind `internal_weight`.
    pub internal_edge_count: usize,
    pub out_strength: T,
    pub in_strength: T,
}

impl<T> CommunityStats<T>
where
    T: FloatOpsTS + 'static,
{
    pub fn empty() -> Self {
        Self {
            internal_weight: T::zero(),
            internal_edge_count: 0,
            out_strength: T::zero(),
            in_strength: T::zero(),
        }
    }

    pub fn of_group(clustering: &Clustering<T>, group: usize) -> Self {
        Self {
            internal_weight: clustering.internal_weight(group),
            internal_edge_count: clustering.internal_edge_count(group),
            out_strength: clustering.out_strength(group),
            in_strength: clustering.in_strength(group),
        }
    }

    #[inline]
    pub fn volume(&self) -> T {
        self.out_strength + self.in_strength
    }

    /// Computes the stats of every community of `partition` by a single pass over the edges.
    /// Nodes outside the partition are ignored.
    pub fn from_partition(network: &Network<T>, partition: &[Vec<usize>]) -> Vec<Self> {
        let mut lookup = vec![usize::MAX; network.node_count()];
        for (community_id, community) in partition.iter().enumerate() {
            for &node in community {
                lookup[node] = community_id;
            }
        }

        let mut stats = vec![Self::empty(); partition.len()];
        for (source, target, weight) in network.edges() {
            let c1 = lookup[source];
            let c2 = lookup[target];
            if c1 != usize::MAX {
                stats[c1].out_strength += weight;
            }
            if c2 != usize::MAX {
                stats[c2].in_strength += weight;
                if c1 == c2 {
                    stats[c2].internal_weight += weight;
                    if weight > T::zero() {
                        stats[c2].internal_edge_count += 1;
                    }
                }
            }
        }
        stats
    }
}

/// Everything a local gain needs about moving `node` from its community A into B.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MoveContext<T> {
    pub current: CommunityStats<T>,
    pub target: CommunityStats<T>,
    /// Weight between the node and the rest of A, both directions.
    pub weight_to_current: T,
    /// Weight between the node and B, both directions.
    pub weight_to_target: T,
    edges_to_current: usize,
    edges_to_target: usize,
    pub self_loop: T,
    pub out_strength: T,
    pub in_strength: T,
    current_is_singleton: bool,
}

impl<T> MoveContext<T>
where
    T: FloatOpsTS + 'static,
{
    pub fn new(network: &Network<T>, node: usize, target: usize, clustering: &Clustering<T>) -> Self {
        let current = clustering.get_group(node);
        let (to_current, to_target) = network.links_to_two_comms(node, current, target, clustering);
        Self {
            current: CommunityStats::of_group(clustering, current),
            target: CommunityStats::of_group(clustering, target),
            weight_to_current: to_current.weight,
            weight_to_target: to_target.weight,
            edges_to_current: to_current.edge_count,
            edges_to_target: to_target.edge_count,
            self_loop: network.self_loop_weight(node),
            out_strength: network.out_strength(node),
            in_strength: network.in_strength(node),
            current_is_singleton: clustering.group_size(current) == 1,
        }
    }

    #[inline]
    fn self_loop_edges(&self) -> usize {
        usize::from(self.self_loop > T::zero())
    }

    /// Stats of A once the node has left it.
    pub fn current_after(&self) -> CommunityStats<T> {
        if self.current_is_singleton {
            return CommunityStats::empty();
        }
        CommunityStats {
            internal_weight: self.current.internal_weight - self.weight_to_current - self.self_loop,
            internal_edge_count: self.current.internal_edge_count
                - self.edges_to_current
                - self.self_loop_edges(),
            out_strength: self.current.out_strength - self.out_strength,
            in_strength: self.current.in_strength - self.in_strength,
        }
    }

    /// Stats of B once the node has joined it.
    pub fn target_after(&self) -> CommunityStats<T> {
        CommunityStats {
            internal_weight: self.target.internal_weight + self.weight_to_target + self.self_loop,
            internal_edge_count: self.target.internal_edge_count
                + self.edges_to_target
                + self.self_loop_edges(),
            out_strength: self.target.out_strength + self.out_strength,
            in_strength: self.target.in_strength + self.in_strength,
        }
    }
}

/// Rounding residue of sums whose magnitude is at most `scale`.
#[inline]
pub(crate) fn zero_tolerance<T>(scale: T) -> T
where
    T: FloatOpsTS + 'static,
{
    Float::abs(scale) * <T as Float>::epsilon() * T::from(16).unwrap_or_else(T::one)
}

/// Registry of the built-in measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityFunction {
    EdgeRatio,
    Modularity,
    ModularityDensity,
}

impl QualityFunction {
    pub const ALL: [QualityFunction; 3] = [
        QualityFunction::EdgeRatio,
        QualityFunction::Modularity,
        QualityFunction::ModularityDensity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QualityFunction::EdgeRatio => "edge_ratio",
            QualityFunction::Modularity => "modularity",
            QualityFunction::ModularityDensity => "modularity_density",
        }
    }
}

impl fmt::Display for QualityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityFunction {
    type Err = ClusteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        QualityFunction::ALL
            .into_iter()
            .find(|function| function.name() == normalized)
            .ok_or_else(|| ClusteringError::UnknownQualityFunction(s.to_string()))
    }
}

impl<T> QualityMeasure<T> for QualityFunction
where
    T: FloatOpsTS + 'static,
{
    fn global_score(&self, network: &Network<T>, partition: &[Vec<usize>], total_weight: T) -> T {
        match self {
            QualityFunction::EdgeRatio => EdgeRatio.global_score(network, partition, total_weight),
            QualityFunction::Modularity => Modularity.global_score(network, partition, total_weight),
            QualityFunction::ModularityDensity => {
                ModularityDensity.global_score(network, partition, total_weight)
            }
        }
    }

    fn local_gain(
        &self,
        network: &Network<T>,
        node: usize,
        target: usize,
        clustering: &Clustering<T>,
        total_weight: T,
    ) -> T {
        match self {
            QualityFunction::EdgeRatio => {
                EdgeRatio.local_gain(network, node, target, clustering, total_weight)
            }
            QualityFunction::Modularity => {
                Modularity.local_gain(network, node, target, clustering, total_weight)
            }
            QualityFunction::ModularityDensity => {
                ModularityDensity.local_gain(network, node, target, clustering, total_weight)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    pub(crate) fn random_network(rng: &mut ChaCha8Rng, node_count: usize, edge_count: usize) -> Network<f64> {
        let mut network = Network::with_nodes(node_count);
        for _ in 0..edge_count {
            let from = rng.random_range(0..node_count);
            let to = rng.random_range(0..node_count);
            let weight = rng.random_range(0.1..3.0);
            network.add_edge(from, to, weight).unwrap();
        }
        network
    }

    pub(crate) fn random_clustering(rng: &mut ChaCha8Rng, network: &Network<f64>, groups: usize) -> Clustering<f64> {
        let assignments: Vec<usize> = (0..network.node_count())
            .map(|_| rng.random_range(0..groups.min(network.node_count())))
            .collect();
        Clustering::from_assignments(network, &assignments).unwrap()
    }

    /// Checks `local_gain` against a brute-force recomputation of the global score.
    pub(crate) fn assert_gain_consistency<Q: QualityMeasure<f64>>(measure: &Q, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..40 {
            let node_count = rng.random_range(2..12);
            let edge_count = rng.random_range(0..30);
            let network = random_network(&mut rng, node_count, edge_count);
            let m = network.size();
            let mut clustering = random_clustering(&mut rng, &network, 4);

            for _ in 0..5 {
                let node = rng.random_range(0..node_count);
                let target = rng.random_range(0..clustering.group_count());
                if target == clustering.get_group(node) {
                    continue;
                }
                let before = measure.global_score(&network, &clustering.inner_partition(), m);
                let gain = measure.local_gain(&network, node, target, &clustering, m);
                clustering.move_node(&network, node, target);
                let after = measure.global_score(&network, &clustering.inner_partition(), m);
                assert!(
                    (gain - (after - before)).abs() < 1e-9,
                    "gain {gain} != {} for node {node}",
                    after - before
                );
            }
        }
    }

    #[test]
    fn test_community_stats_from_partition() {
        let network =
            Network::from_edges(3, &[(0, 1, 1.0), (1, 0, 2.0), (1, 2, 4.0), (2, 2, 8.0)]).unwrap();
        let stats = CommunityStats::from_partition(&network, &[vec![0, 1], vec![2]]);
        assert_eq!(stats[0].internal_weight, 3.0);
        assert_eq!(stats[0].internal_edge_count, 2);
        assert_eq!(stats[0].out_strength, 7.0);
        assert_eq!(stats[0].in_strength, 3.0);
        assert_eq!(stats[1].internal_weight, 8.0);
        assert_eq!(stats[1].internal_edge_count, 1);
        assert_eq!(stats[1].volume(), 8.0 + 12.0);
    }

    #[test]
    fn test_move_context_after_stats() {
        let network =
            Network::from_edges(3, &[(0, 1, 1.0), (1, 0, 2.0), (1, 2, 4.0), (2, 2, 8.0)]).unwrap();
        let clustering = Clustering::from_assignments(&network, &[0, 0, 1]).unwrap();
        let context = MoveContext::new(&network, 1, 1, &clustering);
        assert_eq!(context.weight_to_current, 3.0);
        assert_eq!(context.weight_to_target, 4.0);

        let after_current = context.current_after();
        assert_eq!(after_current.internal_weight, 0.0);
        assert_eq!(after_current.internal_edge_count, 0);
        assert_eq!(after_current.out_strength, 1.0);

        let after_target = context.target_after();
        assert_eq!(after_target.internal_weight, 12.0);
        assert_eq!(after_target.internal_edge_count, 2);
        assert_eq!(after_target.in_strength, 12.0 + 1.0);
    }

    #[test]
    fn test_quality_function_names() {
        for function in QualityFunction::ALL {
            assert_eq!(function.name().parse::<QualityFunction>(), Ok(function));
        }
        assert_eq!(
            "Modularity-Density".parse::<QualityFunction>(),
            Ok(QualityFunction::ModularityDensity)
        );
        assert_eq!(QualityFunction::EdgeRatio.to_string(), "edge_ratio");
        assert!(matches!(
            "conductance".parse::<QualityFunction>(),
            Err(ClusteringError::UnknownQualityFunction(_))
        ));
    }

    #[test]
    fn test_registry_matches_measures() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let network = random_network(&mut rng, 10, 25);
        let clustering = random_clustering(&mut rng, &network, 3);
        let partition = clustering.inner_partition();
        let m = network.size();
        let target = (clustering.get_group(0) + 1) % clustering.group_count();

        assert_eq!(
            QualityFunction::Modularity.global_score(&network, &partition, m),
            Modularity.global_score(&network, &partition, m)
        );
        assert_eq!(
            QualityFunction::EdgeRatio.global_score(&network, &partition, m),
            EdgeRatio.global_score(&network, &partition, m)
        );
        assert_eq!(
            QualityFunction::ModularityDensity.local_gain(&network, 0, target, &clustering, m),
            ModularityDensity.local_gain(&network, 0, target, &clustering, m)
        );
    }
}
