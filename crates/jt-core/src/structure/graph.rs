//! Undirected adjacency view over network node indices.

use jt_common::Network;
use std::collections::BTreeSet;

/// Simple undirected graph over vertices `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndirectedGraph {
    adjacency: Vec<BTreeSet<usize>>,
}

impl UndirectedGraph {
    /// Graph with `n` vertices and no edges.
    pub fn new(n: usize) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); n],
        }
    }

    /// Skeleton of the network: one edge per parent/child pair.
    pub fn from_network(network: &Network) -> Self {
        let mut graph = Self::new(network.len());
        for child in 0..network.len() {
            for &parent in network.parents(child) {
                graph.add_edge(parent, child);
            }
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Add the edge `a - b`. Returns true if it was not present. Self loops
    /// are ignored.
    pub fn add_edge(&mut self, a: usize, b: usize) -> bool {
        if a == b {
            return false;
        }
        let inserted = self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
        inserted
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].contains(&b)
    }

    pub fn neighbors(&self, v: usize) -> &BTreeSet<usize> {
        &self.adjacency[v]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    /// All edges as `(low, high)` pairs in ascending order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(a, ns)| ns.iter().filter(move |&&b| a < b).map(move |&b| (a, b)))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Chordality check via maximum cardinality search.
    ///
    /// Visits vertices by most already-visited neighbours; the graph is
    /// chordal iff, for every vertex, its visited neighbours other than the
    /// most recently visited one are all adjacent to that one.
    pub fn is_chordal(&self) -> bool {
        let n = self.len();
        let mut weight = vec![0usize; n];
        let mut position = vec![usize::MAX; n];
        let mut order = Vec::with_capacity(n);

        for step in 0..n {
            let Some(v) = (0..n)
                .filter(|&v| position[v] == usize::MAX)
                .max_by(|&a, &b| weight[a].cmp(&weight[b]).then(b.cmp(&a)))
            else {
                break;
            };
            position[v] = step;
            order.push(v);
            for &u in &self.adjacency[v] {
                if position[u] == usize::MAX {
                    weight[u] += 1;
                }
            }
        }

        for &v in &order {
            let earlier: Vec<usize> = self.adjacency[v]
                .iter()
                .copied()
                .filter(|&u| position[u] < position[v])
                .collect();
            let Some(&latest) = earlier.iter().max_by_key(|&&u| position[u]) else {
                continue;
            };
            if earlier
                .iter()
                .any(|&u| u != latest && !self.has_edge(u, latest))
            {
                return false;
            }
        }
        true
    }
}
