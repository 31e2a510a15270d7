use crate::error::{ClusteringError, Result};
use crate::network::grouping::NetworkGrouping;
use nalgebra_sparse::CsrMatrix;
use num_traits::Float;
use petgraph::graph::{DiGraph, Edges, IndexType, NodeIndex};
use petgraph::prelude::EdgeRef;
use petgraph::{Directed, Direction};
use single_utilities::traits::FloatOpsTS;
use std::collections::BTreeMap;

pub mod aggregate;
pub mod builder;
pub mod grouping;

pub type Graph<E> = DiGraph<(), E>;

/// Directed weighted graph over the dense node range `0..n`.
///
/// At most one edge is stored per ordered pair: adding an edge that already
/// exists sums the weights. Per-node strengths and the total weight are kept
/// up to date on every insertion.
#[derive(Debug, Clone)]
pub struct Network<T> {
    graph: Graph<T>,
    out_strengths: Vec<T>,
    in_strengths: Vec<T>,
    total_weight: T,
}

pub struct NeighborAndWeightIterator<'a, T: 'a> {
    edge_iter: Edges<'a, T, Directed>,
    home_node: usize,
}

impl<T> Iterator for NeighborAndWeightIterator<'_, T>
where
    T: Copy,
{
    type Item = (usize, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.edge_iter.next().map(|edge_ref| {
            let neighbor = if edge_ref.source().index() == self.home_node {
                edge_ref.target().index()
            } else {
                edge_ref.source().index()
            };
            (neighbor, *edge_ref.weight())
        })
    }
}

/// Weight between a node and one community, with the number of edges carrying
/// it. Zero-weight edges are not counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommunityLink<T> {
    pub weight: T,
    pub edge_count: usize,
}

impl<T> CommunityLink<T>
where
    T: FloatOpsTS + 'static,
{
    pub fn none() -> Self {
        Self {
            weight: T::zero(),
            edge_count: 0,
        }
    }

    #[inline]
    fn add(&mut self, weight: T) {
        self.weight += weight;
        if weight > T::zero() {
            self.edge_count += 1;
        }
    }
}

impl<T> Default for Network<T>
where
    T: FloatOpsTS + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Network<T>
where
    T: FloatOpsTS + 'static,
{
    pub fn new() -> Self {
        Network {
            graph: Graph::new(),
            out_strengths: Vec::new(),
            in_strengths: Vec::new(),
            total_weight: T::zero(),
        }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Network {
            graph: Graph::with_capacity(nodes, edges),
            out_strengths: Vec::with_capacity(nodes),
            in_strengths: Vec::with_capacity(nodes),
            total_weight: T::zero(),
        }
    }

    /// Network with `node_count` isolated nodes.
    pub fn with_nodes(node_count: usize) -> Self {
        let mut network = Self::with_capacity(node_count, 0);
        for _ in 0..node_count {
            network.add_node();
        }
        network
    }

    pub fn from_edges(node_count: usize, edges: &[(usize, usize, T)]) -> Result<Self> {
        let mut network = Self::with_capacity(node_count, edges.len());
        for _ in 0..node_count {
            network.add_node();
        }
        for &(from, to, weight) in edges {
            network.add_edge(from, to, weight)?;
        }
        Ok(network)
    }

    /// Working copy of a petgraph digraph. Node `i` of the result is `NodeIndex::new(i)`
    /// of the input; parallel edges are merged into one summed edge.
    pub fn from_petgraph<N, E, Ix, F>(graph: &petgraph::Graph<N, E, Directed, Ix>, weight: F) -> Result<Self>
    where
        Ix: IndexType,
        F: Fn(&E) -> T,
    {
        let mut network = Self::with_capacity(graph.node_count(), graph.edge_count());
        for _ in 0..graph.node_count() {
            network.add_node();
        }
        for edge in graph.edge_references() {
            network.add_edge(edge.source().index(), edge.target().index(), weight(edge.weight()))?;
        }
        Ok(network)
    }

    /// Builds a network from a directed adjacency matrix, `matrix[(row, col)]` being
    /// the weight of the edge `row -> col`. Explicit zeros are skipped.
    pub fn from_csr_matrix(matrix: &CsrMatrix<T>) -> Result<Self> {
        let n_nodes = matrix.nrows().max(matrix.ncols());
        let mut network = Self::with_capacity(n_nodes, matrix.nnz());
        for _ in 0..n_nodes {
            network.add_node();
        }
        for (row, col, &weight) in matrix.triplet_iter() {
            if weight != T::zero() {
                network.add_edge(row, col, weight)?;
            }
        }
        Ok(network)
    }

    pub fn add_node(&mut self) -> usize {
        let index = self.graph.add_node(());
        self.out_strengths.push(T::zero());
        self.in_strengths.push(T::zero());
        index.index()
    }

    /// Adds `weight` to the edge `from -> to`, creating it if needed.
    pub fn add_edge(&mut self, from: usize, to: usize, weight: T) -> Result<()> {
        let node_count = self.node_count();
        for node in [from, to] {
            if node >= node_count {
                return Err(ClusteringError::NodeOutOfRange { node, node_count });
            }
        }
        if !Float::is_finite(weight) || weight < T::zero() {
            return Err(ClusteringError::InvalidWeight(
                weight.to_f64().unwrap_or(f64::NAN),
            ));
        }
        self.merge_edge(from, to, weight);
        Ok(())
    }

    pub(crate) fn merge_edge(&mut self, from: usize, to: usize, weight: T) {
        let (a, b) = (NodeIndex::new(from), NodeIndex::new(to));
        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph[edge] += weight,
            None => {
                self.graph.add_edge(a, b, weight);
            }
        }
        self.out_strengths[from] += weight;
        self.in_strengths[to] += weight;
        self.total_weight += weight;
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct directed edges, self-loops included.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Total edge weight `m`.
    #[inline]
    pub fn size(&self) -> T {
        self.total_weight
    }

    #[inline]
    pub fn out_strength(&self, node: usize) -> T {
        self.out_strengths[node]
    }

    #[inline]
    pub fn in_strength(&self, node: usize) -> T {
        self.in_strengths[node]
    }

    pub fn out_edges(&self, node: usize) -> NeighborAndWeightIterator<'_, T> {
        NeighborAndWeightIterator {
            edge_iter: self
                .graph
                .edges_directed(NodeIndex::new(node), Direction::Outgoing),
            home_node: node,
        }
    }

    pub fn in_edges(&self, node: usize) -> NeighborAndWeightIterator<'_, T> {
        NeighborAndWeightIterator {
            edge_iter: self
                .graph
                .edges_directed(NodeIndex::new(node), Direction::Incoming),
            home_node: node,
        }
    }

    /// All edges as `(source, target, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index(), *edge.weight()))
    }

    pub fn edge_weight(&self, from: usize, to: usize) -> Option<T> {
        self.graph
            .find_edge(NodeIndex::new(from), NodeIndex::new(to))
            .map(|edge| self.graph[edge])
    }

    #[inline]
    pub fn self_loop_weight(&self, node: usize) -> T {
        self.edge_weight(node, node).unwrap_or_else(T::zero)
    }

    /// Successors and predecessors of `node`, deduplicated, ascending, without `node` itself.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        let mut result = Vec::new();
        self.neighbors_into(node, &mut result);
        result
    }

    pub fn neighbors_into(&self, node: usize, result: &mut Vec<usize>) {
        result.clear();
        result.extend(
            self.graph
                .neighbors_undirected(NodeIndex::new(node))
                .map(|neighbor| neighbor.index())
                .filter(|&neighbor| neighbor != node),
        );
        result.sort_unstable();
        result.dedup();
    }

    /// Links between `node` and the members of two communities, both directions
    /// summed, self-loops excluded.
    #[inline]
    pub fn links_to_two_comms(
        &self,
        node: usize,
        comm1: usize,
        comm2: usize,
        grouping: &impl NetworkGrouping,
    ) -> (CommunityLink<T>, CommunityLink<T>) {
        let mut l1 = CommunityLink::none();
        let mut l2 = CommunityLink::none();

        for (neighbor, weight) in self.out_edges(node).chain(self.in_edges(node)) {
            if neighbor == node {
                continue;
            }
            let neighbor_comm = grouping.get_group(neighbor);
            if neighbor_comm == comm1 {
                l1.add(weight);
            } else if neighbor_comm == comm2 {
                l2.add(weight);
            }
        }

        (l1, l2)
    }

    /// Collapses every group into a single node. Edges are carried over with
    /// their weights summed per ordered pair of groups; edges inside a group
    /// become self-loops, so the total weight is unchanged.
    ///
    /// The grouping must not contain empty groups.
    pub fn create_reduced_network<G: NetworkGrouping>(&self, grouping: &G) -> Self {
        let group_count = grouping.group_count();
        let mut edge_memo = BTreeMap::new();

        for (source, target, weight) in self.edges() {
            let g1 = grouping.get_group(source);
            let g2 = grouping.get_group(target);
            *edge_memo.entry((g1, g2)).or_insert_with(T::zero) += weight;
        }

        let mut reduced = Self::with_capacity(group_count, edge_memo.len());
        for _ in 0..group_count {
            reduced.add_node();
        }
        for ((g1, g2), weight) in edge_memo {
            reduced.merge_edge(g1, g2, weight);
        }
        reduced
    }
}
