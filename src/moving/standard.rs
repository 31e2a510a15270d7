use crate::network::Network;
use crate::network::grouping::{Clustering, NetworkGrouping};
use crate::quality::QualityMeasure;
use log::trace;
use rand::RngCore;
use rand::prelude::SliceRandom;
use single_utilities::traits::FloatOpsTS;

/// Greedy local moving of one level.
///
/// Nodes are visited in a freshly shuffled order on every sweep; each node
/// joins the neighboring community with the largest gain, provided that gain
/// exceeds `move_epsilon`. Equal gains resolve to the lowest community id.
/// Sweeps repeat until one of them moves nothing.
#[derive(Debug)]
pub struct StandardLocalMoving<T>
where
    T: FloatOpsTS,
{
    move_epsilon: T,
    node_order: Vec<usize>,
    neighbors: Vec<usize>,
    neighboring_clusters: Vec<usize>,
}

impl<T> StandardLocalMoving<T>
where
    T: FloatOpsTS + 'static,
{
    pub fn new(move_epsilon: T) -> Self {
        StandardLocalMoving {
            move_epsilon,
            node_order: Vec::new(),
            neighbors: Vec::new(),
            neighboring_clusters: Vec::new(),
        }
    }

    /// Runs sweeps until convergence and normalizes `clustering`.
    /// Returns whether any node moved.
    pub fn iterate<Q, R>(
        &mut self,
        network: &Network<T>,
        clustering: &mut Clustering<T>,
        quality: &Q,
        total_weight: T,
        rng: &mut R,
    ) -> bool
    where
        Q: QualityMeasure<T> + ?Sized,
        R: RngCore,
    {
        let node_count = network.node_count();
        debug_assert_eq!(node_count, clustering.node_count());
        if node_count == 0 {
            return false;
        }

        self.node_order.clear();
        self.node_order.extend(0..node_count);

        let mut global_update = false;
        let mut sweep = 0;
        loop {
            self.node_order.shuffle(rng);
            let mut moves = 0;

            for index in 0..node_count {
                let node = self.node_order[index];
                let best_cluster = self.best_cluster(network, node, clustering, quality, total_weight);
                if best_cluster != clustering.get_group(node) {
                    clustering.move_node(network, node, best_cluster);
                    moves += 1;
                }
            }

            trace!("sweep {sweep}: {moves} moves over {node_count} nodes");
            sweep += 1;
            if moves == 0 {
                break;
            }
            global_update = true;
        }

        clustering.normalize_groups();
        global_update
    }

    /// The neighboring community with the largest gain above `move_epsilon`,
    /// or the node's own community if there is none.
    fn best_cluster<Q>(
        &mut self,
        network: &Network<T>,
        node: usize,
        clustering: &Clustering<T>,
        quality: &Q,
        total_weight: T,
    ) -> usize
    where
        Q: QualityMeasure<T> + ?Sized,
    {
        let current_cluster = clustering.get_group(node);

        network.neighbors_into(node, &mut self.neighbors);
        self.neighboring_clusters.clear();
        self.neighboring_clusters.extend(
            self.neighbors
                .iter()
                .map(|&neighbor| clustering.get_group(neighbor))
                .filter(|&cluster| cluster != current_cluster),
        );
        // ascending, so equal gains keep the lowest id
        self.neighboring_clusters.sort_unstable();
        self.neighboring_clusters.dedup();

        let mut best_cluster = current_cluster;
        let mut max_quality_increment = self.move_epsilon;
        for &cluster in &self.neighboring_clusters {
            let quality_increment = quality.local_gain(network, node, cluster, clustering, total_weight);
            if quality_increment > max_quality_increment {
                best_cluster = cluster;
                max_quality_increment = quality_increment;
            }
        }
        best_cluster
    }
}
