use single_utilities::traits::FloatOpsTS;

use crate::network::Network;
use crate::network::grouping::Clustering;
use crate::quality::{CommunityStats, MoveContext, QualityMeasure, zero_tolerance};

/// Sum over communities of `internal / (internal + boundary)`, where `internal`
/// is the weight of the edges inside the community and `boundary` the weight
/// of the edges with exactly one endpoint in it. A community without internal
/// weight scores 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeRatio;

impl EdgeRatio {
    /// `internal + boundary` is the volume minus the internal weight, since
    /// every internal edge is counted twice in the volume.
    #[inline]
    fn ratio<T>(stats: &CommunityStats<T>) -> T
    where
        T: FloatOpsTS + 'static,
    {
        if stats.internal_edge_count == 0 || stats.internal_weight <= T::zero() {
            return T::zero();
        }
        let volume = stats.volume();
        let touching = volume - stats.internal_weight;
        // a closed community has no boundary, only summation residue
        if touching <= zero_tolerance(volume) {
            return T::zero();
        }
        stats.internal_weight / touching
    }
}

impl<T> QualityMeasure<T> for EdgeRatio
where
    T: FloatOpsTS + 'static,
{
    fn global_score(&self, network: &Network<T>, partition: &[Vec<usize>], _total_weight: T) -> T {
        let mut score = T::zero();
        for stats in CommunityStats::from_partition(network, partition) {
            score += Self::ratio(&stats);
        }
        score
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
        let old_score = Self::ratio(&context.current) + Self::ratio(&context.target);
        let new_score = Self::ratio(&context.current_after()) + Self::ratio(&context.target_after());
        new_score - old_score
    }
}
