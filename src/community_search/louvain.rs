use crate::error::Result;
use crate::moving::standard::StandardLocalMoving;
use crate::network::Network;
use crate::network::aggregate::{SupernodeMembers, aggregate};
use crate::network::grouping::{Clustering, Partition, validate_partition};
use crate::quality::{QualityFunction, QualityMeasure};
use log::{debug, info};
use num_traits::Float;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use single_utilities::traits::FloatOpsTS;

#[derive(Debug, Clone)]
pub struct LouvainConfig<T> {
    /// A level whose score differs from the previous one by at most this much ends the run.
    pub threshold: T,
    /// Minimum gain for moving a single node.
    pub move_epsilon: T,
    pub seed: Option<u64>,
}

impl<T> Default for LouvainConfig<T>
where
    T: FloatOpsTS + 'static,
{
    fn default() -> Self {
        Self {
            threshold: T::from(1e-7).unwrap_or_else(<T as Float>::epsilon),
            move_epsilon: T::from(1e-13).unwrap_or_else(<T as Float>::epsilon),
            seed: None,
        }
    }
}

impl<T> LouvainConfig<T>
where
    T: FloatOpsTS + 'static,
{
    pub fn with_threshold(mut self, threshold: T) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_move_epsilon(mut self, move_epsilon: T) -> Self {
        self.move_epsilon = move_epsilon;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Multi-level Louvain optimizer over a pluggable quality measure.
///
/// The random generator lives in the instance: two runs on the same instance
/// continue the same random stream, two instances with the same seed produce
/// the same levels.
pub struct Louvain<T, Q>
where
    T: FloatOpsTS,
{
    config: LouvainConfig<T>,
    quality: Q,
    rng: ChaCha20Rng,
    local_moving: StandardLocalMoving<T>,
}

impl<T, Q> Louvain<T, Q>
where
    T: FloatOpsTS + 'static,
    Q: QualityMeasure<T>,
{
    pub fn new(quality: Q, config: LouvainConfig<T>) -> Self {
        let seed = config.seed.unwrap_or_default();
        Louvain {
            rng: ChaCha20Rng::seed_from_u64(seed),
            local_moving: StandardLocalMoving::new(config.move_epsilon),
            config,
            quality,
        }
    }

    pub fn with_seed(quality: Q, seed: Option<u64>) -> Self {
        Self::new(
            quality,
            LouvainConfig {
                seed,
                ..LouvainConfig::default()
            },
        )
    }

    pub fn config(&self) -> &LouvainConfig<T> {
        &self.config
    }

    pub fn quality(&self) -> &Q {
        &self.quality
    }

    /// The partition of every level, coarsest last.
    pub fn levels<'a>(&'a mut self, network: &'a Network<T>) -> LouvainLevels<'a, T, Q> {
        LouvainLevels {
            total_weight: network.size(),
            louvain: self,
            original: network,
            state: LevelState::Initializing,
        }
    }

    /// The final partition; empty for an empty network.
    pub fn communities(&mut self, network: &Network<T>) -> Partition {
        self.levels(network).last().unwrap_or_default()
    }

    /// Runs a single local moving phase on `clustering`.
    pub fn iterate_one_level(&mut self, network: &Network<T>, clustering: &mut Clustering<T>) -> bool {
        self.local_moving
            .iterate(network, clustering, &self.quality, network.size(), &mut self.rng)
    }

    /// Score of a partition this crate produced for `network`.
    pub fn quality_of(&self, network: &Network<T>, partition: &[Vec<usize>]) -> T {
        self.quality.global_score(network, partition, network.size())
    }

    /// Score of a partition coming from elsewhere, e.g. a ground truth.
    /// The partition is validated first.
    pub fn score_partition(&self, network: &Network<T>, partition: &[Vec<usize>]) -> Result<T> {
        validate_partition(network.node_count(), partition)?;
        Ok(self.quality_of(network, partition))
    }
}

impl<T> Louvain<T, QualityFunction>
where
    T: FloatOpsTS + 'static,
{
    pub fn new_with_quality_function(quality_function: QualityFunction, seed: Option<u64>) -> Self {
        Self::with_seed(quality_function, seed)
    }

    pub fn new_modularity(seed: Option<u64>) -> Self {
        Self::new_with_quality_function(QualityFunction::Modularity, seed)
    }

    pub fn new_edge_ratio(seed: Option<u64>) -> Self {
        Self::new_with_quality_function(QualityFunction::EdgeRatio, seed)
    }

    pub fn new_modularity_density(seed: Option<u64>) -> Self {
        Self::new_with_quality_function(QualityFunction::ModularityDensity, seed)
    }
}

struct LevelContext<T> {
    network: Network<T>,
    members: SupernodeMembers,
    score: T,
    level: usize,
}

enum LevelState<T> {
    Initializing,
    LevelRunning(LevelContext<T>),
    Converged,
}

/// Iterator over the partitions of successive levels, in terms of the
/// original network. Ends once a level stops improving the score.
pub struct LouvainLevels<'a, T, Q>
where
    T: FloatOpsTS,
{
    louvain: &'a mut Louvain<T, Q>,
    original: &'a Network<T>,
    total_weight: T,
    state: LevelState<T>,
}

impl<T, Q> LouvainLevels<'_, T, Q>
where
    T: FloatOpsTS + 'static,
    Q: QualityMeasure<T>,
{
    fn initialize(&mut self) -> LevelState<T> {
        let node_count = self.original.node_count();
        if node_count == 0 {
            debug!("empty network, nothing to cluster");
            return LevelState::Converged;
        }

        let singletons: Partition = (0..node_count).map(|node| vec![node]).collect();
        let score = self
            .louvain
            .quality
            .global_score(self.original, &singletons, self.total_weight);
        debug!(
            "starting louvain on {} nodes, {} edges, baseline score {:.6}",
            node_count,
            self.original.edge_count(),
            score.to_f64().unwrap_or(f64::NAN)
        );

        LevelState::LevelRunning(LevelContext {
            network: self.original.clone(),
            members: SupernodeMembers::identity(node_count),
            score,
            level: 0,
        })
    }

    fn run_level(&mut self, context: LevelContext<T>) -> Option<Partition> {
        let LevelContext {
            network,
            members,
            score,
            level,
        } = context;
        let louvain = &mut *self.louvain;

        let mut clustering = Clustering::create_isolated(&network);
        let improved = louvain.local_moving.iterate(
            &network,
            &mut clustering,
            &louvain.quality,
            self.total_weight,
            &mut louvain.rng,
        );
        if !improved && level > 0 {
            info!("level {level}: no node moved, converged");
            return None;
        }

        let partition = members.expand(&clustering.inner_partition());
        let new_score = louvain
            .quality
            .global_score(self.original, &partition, self.total_weight);
        debug!(
            "level {}: {} nodes -> {} communities, score {:.6}",
            level,
            network.node_count(),
            partition.len(),
            new_score.to_f64().unwrap_or(f64::NAN)
        );

        if Float::abs(new_score - score) <= louvain.config.threshold {
            info!(
                "level {level}: score improvement below threshold, converged with {} communities",
                partition.len()
            );
        } else {
            let reduced = aggregate(&network, &members, &clustering);
            self.state = LevelState::LevelRunning(LevelContext {
                network: reduced.network,
                members: reduced.members,
                score: new_score,
                level: level + 1,
            });
        }
        Some(partition)
    }
}

impl<T, Q> Iterator for LouvainLevels<'_, T, Q>
where
    T: FloatOpsTS + 'static,
    Q: QualityMeasure<T>,
{
    type Item = Partition;

    fn next(&mut self) -> Option<Partition> {
        loop {
            match std::mem::replace(&mut self.state, LevelState::Converged) {
                LevelState::Initializing => self.state = self.initialize(),
                LevelState::LevelRunning(context) => return self.run_level(context),
                LevelState::Converged => return None,
            }
        }
    }
}
