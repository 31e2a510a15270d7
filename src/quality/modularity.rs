use single_utilities::traits::FloatOpsTS;

use crate::network::Network;
use crate::network::grouping::Clustering;
use crate::quality::{CommunityStats, MoveContext, QualityMeasure};

/// Weighted directed modularity:
/// `Q = 1/m * sum_C (I_C - Kout_C * Kin_C / m)`.
///
/// `I_C` is the weight of the edges inside `C`; `Kout_C` and `Kin_C` are the
/// summed out- and in-strengths of its nodes. Zero when `m` is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modularity;

impl Modularity {
    #[inline]
    fn community_term<T>(stats: &CommunityStats<T>, total_weight: T) -> T
    where
        T: FloatOpsTS + 'static,
    {
        stats.internal_weight - stats.out_strength * stats.in_strength / total_weight
    }

    pub(crate) fn gain_from_context<T>(context: &MoveContext<T>, total_weight: T) -> T
    where
        T: FloatOpsTS + 'static,
    {
        let delta_internal = context.weight_to_target - context.weight_to_current;
        let two = T::one() + T::one();
        let delta_null = context.out_strength
            * (context.target.in_strength - context.current.in_strength)
            + context.in_strength * (context.target.out_strength - context.current.out_strength)
            + two * context.out_strength * context.in_strength;

        (delta_internal - delta_null / total_weight) / total_weight
    }
}

impl<T> QualityMeasure<T> for Modularity
where
    T: FloatOpsTS + 'static,
{
    fn global_score(&self, network: &Network<T>, partition: &[Vec<usize>], total_weight: T) -> T {
        if total_weight <= T::zero() {
            return T::zero();
        }

        let mut modularity = T::zero();
        for stats in CommunityStats::from_partition(network, partition) {
            modularity += Self::community_term(&stats, total_weight);
        }
        modularity / total_weight
    }

    fn local_gain(
        &self,
        network: &Network<T>,
        node: usize,
        target: usize,
        clustering: &Clustering<T>,
        total_weight: T,
    ) -> T {
        if total_weight <= T::zero() {
            return T::zero();
        }
        let context = MoveContext::new(network, node, target, clustering);
        Self::gain_from_context(&context, total_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::tests::assert_gain_consistency;

    // directed triangle 0 -> 1 -> 2 -> 0 with a tail 2 -> 3
    fn create_test_network() -> Network<f64> {
        Network::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0), (2, 3, 1.0)]).unwrap()
    }

    #[test]
    fn test_global_score() {
        let network = create_test_network();
        let m = network.size();

        let singletons = vec![vec![0], vec![1], vec![2], vec![3]];
        assert!((Modularity.global_score(&network, &singletons, m) + 0.25).abs() < 1e-12);

        let triangle = vec![vec![0, 1, 2], vec![3]];
        assert!(Modularity.global_score(&network, &triangle, m).abs() < 1e-12);

        let whole = vec![vec![0, 1, 2, 3]];
        assert!(Modularity.global_score(&network, &whole, m).abs() < 1e-12);
    }

    #[test]
    fn test_local_gain_matches_global_difference() {
        let network = create_test_network();
        let m = network.size();
        let mut clustering = Clustering::create_isolated(&network);

        let gain = Modularity.local_gain(&network, 0, 1, &clustering, m);
        let before = Modularity.global_score(&network, &clustering.inner_partition(), m);
        clustering.move_node(&network, 0, 1);
        let after = Modularity.global_score(&network, &clustering.inner_partition(), m);
        assert!((gain - (after - before)).abs() < 1e-12);
        assert!(gain > 0.0);
    }

    #[test]
    fn test_zero_total_weight() {
        let network = Network::<f64>::with_nodes(3);
        let clustering = Clustering::create_isolated(&network);
        assert_eq!(Modularity.global_score(&network, &[vec![0, 1], vec![2]], 0.0), 0.0);
        assert_eq!(Modularity.local_gain(&network, 0, 1, &clustering, 0.0), 0.0);
    }

    #[test]
    fn test_gain_consistency_on_random_graphs() {
        assert_gain_consistency(&Modularity, 11);
    }
}
