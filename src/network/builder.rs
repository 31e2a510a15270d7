use crate::error::Result;
use crate::network::Network;
use single_utilities::traits::FloatOpsTS;
use std::collections::HashMap;
use std::hash::Hash;

/// Builds a [`Network`] from edges between arbitrary hashable node identities
/// (integers, strings, ...). Identities get dense ids in first-seen order.
#[derive(Debug, Clone)]
pub struct NetworkBuilder<K, T> {
    index: HashMap<K, usize>,
    labels: Vec<K>,
    edges: Vec<(usize, usize, T)>,
}

impl<K, T> Default for NetworkBuilder<K, T>
where
    K: Hash + Eq + Clone,
    T: FloatOpsTS + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> NetworkBuilder<K, T>
where
    K: Hash + Eq + Clone,
    T: FloatOpsTS + 'static,
{
    pub fn new() -> Self {
        NetworkBuilder {
            index: HashMap::new(),
            labels: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Registers `key` (a no-op if already known) and returns its dense id.
    pub fn add_node(&mut self, key: K) -> usize {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.labels.len();
        self.index.insert(key.clone(), id);
        self.labels.push(key);
        id
    }

    /// Adds a directed edge; a missing weight counts as 1.
    pub fn add_edge(&mut self, from: K, to: K, weight: Option<T>) -> &mut Self {
        let from = self.add_node(from);
        let to = self.add_node(to);
        self.edges.push((from, to, weight.unwrap_or_else(T::one)));
        self
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Fails if any edge weight is negative or not finite.
    pub fn build(self) -> Result<LabeledNetwork<K, T>> {
        let network = Network::from_edges(self.labels.len(), &self.edges)?;
        Ok(LabeledNetwork {
            network,
            labels: self.labels,
            index: self.index,
        })
    }
}

/// A network together with the caller's identity of every node.
#[derive(Debug, Clone)]
pub struct LabeledNetwork<K, T> {
    pub network: Network<T>,
    labels: Vec<K>,
    index: HashMap<K, usize>,
}

impl<K, T> LabeledNetwork<K, T>
where
    K: Hash + Eq + Clone,
{
    #[inline]
    pub fn label(&self, node: usize) -> &K {
        &self.labels[node]
    }

    pub fn node_id(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Translates a partition of dense ids into the caller's identities.
    pub fn relabel(&self, partition: &[Vec<usize>]) -> Vec<Vec<K>> {
        partition
            .iter()
            .map(|community| {
                community
                    .iter()
                    .map(|&node| self.labels[node].clone())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusteringError;

    #[test]
    fn test_build_network_from_string_ids() {
        let mut builder = NetworkBuilder::<&str, f64>::new();
        builder
            .add_edge("alice", "bob", Some(2.0))
            .add_edge("bob", "carol", None)
            .add_edge("alice", "bob", Some(0.5));
        builder.add_node("dave");

        let labeled = builder.build().unwrap();
        assert_eq!(labeled.network.node_count(), 4);
        assert_eq!(labeled.network.edge_count(), 2);
        assert_eq!(labeled.network.edge_weight(0, 1), Some(2.5));
        assert_eq!(labeled.network.edge_weight(1, 2), Some(1.0));
        assert_eq!(labeled.node_id(&"dave"), Some(3));
        assert_eq!(labeled.label(2), &"carol");

        let communities = labeled.relabel(&[vec![0, 1], vec![2, 3]]);
        assert_eq!(communities, vec![vec!["alice", "bob"], vec!["carol", "dave"]]);
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let mut builder = NetworkBuilder::<u32, f64>::new();
        builder.add_edge(10, 20, Some(-3.0));
        assert_eq!(
            builder.build().unwrap_err(),
            ClusteringError::InvalidWeight(-3.0)
        );
    }
}
