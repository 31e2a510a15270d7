use single_utilities::traits::FloatOpsTS;

use crate::network::Network;
use crate::network::grouping::Clustering;
use crate::quality::{CommunityStats, Modularity, MoveContext, QualityMeasure};

/// Modularity minus a split penalty: the weight of the edges running between
/// different communities, divided by `m`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModularityDensity;

impl<T> QualityMeasure<T> for ModularityDensity
where
    T: FloatOpsTS + 'static,
{
    fn global_score(&self, network: &Network<T>, partition: &[Vec<usize>], total_weight: T) -> T {
        if total_weight <= T::zero() {
            return T::zero();
        }

        let mut score = T::zero();
        for stats in CommunityStats::from_partition(network, partition) {
            let null_model = stats.out_strength * stats.in_strength / total_weight;
            // edges leaving the community, each cut edge is seen once
            let split_penalty = stats.out_strength - stats.internal_weight;
            score += stats.internal_weight - null_model - split_penalty;
        }
        score / total_weight
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
        let modularity_gain = Modularity::gain_from_context(&context, total_weight);
        let split_penalty_decrease = context.weight_to_target - context.weight_to_current;
        modularity_gain + split_penalty_decrease / total_weight
    }
}
