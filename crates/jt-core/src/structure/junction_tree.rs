//! Clique extraction and junction-tree construction.
//!
//! # Algorithm
//!
//! 1. Moralize the network, connecting the forced node set
//! 2. Triangulate with greedy min-fill
//! 3. Take the maximal elimination cliques
//! 4. Weight every clique pair by the size of its intersection
//! 5. Keep a maximum-weight spanning forest (Kruskal)
//!
//! Kruskal considers heavier pairs first; among equal weights the pair with
//! the lexicographically smaller `(low id, high id)` goes first. Pairs sharing
//! no node are never joined, so a disconnected network yields one tree per
//! component. A maximum-weight spanning tree of the clique graph of a chordal
//! graph satisfies running intersection.

use jt_common::{Error, Network, Result};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

use super::moral::moralize;
use super::triangulate::{maximal_cliques, triangulate};

/// A maximal clique of the triangulated graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clique {
    pub id: usize,
    /// Sorted node indices.
    pub nodes: Vec<usize>,
}

impl Clique {
    pub fn contains(&self, node: usize) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }

    pub fn contains_all(&self, nodes: &[usize]) -> bool {
        nodes.iter().all(|&n| self.contains(n))
    }
}

/// Separator between two adjacent cliques.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SepSet {
    /// Clique ids as `(low, high)`.
    pub cliques: (usize, usize),
    /// Sorted shared node indices.
    pub nodes: Vec<usize>,
}

/// Junction forest over the maximal cliques of a triangulated network.
#[derive(Debug, Clone)]
pub struct JunctionTree {
    cliques: Vec<Clique>,
    sepsets: Vec<SepSet>,
    /// Per clique: `(neighbour id, sepset index)` sorted by neighbour id.
    neighbors: Vec<Vec<(usize, usize)>>,
    components: Vec<Vec<usize>>,
    component_of: Vec<usize>,
    fill_ins: Vec<(usize, usize)>,
    elimination_order: Vec<usize>,
    forced: Vec<usize>,
    big_clique: Option<usize>,
}

/// Serializable description of a junction tree, by node id.
#[derive(Debug, Clone, Serialize)]
pub struct StructureReport {
    pub cliques: Vec<Vec<String>>,
    pub sepsets: Vec<SepSetReport>,
    pub fill_ins: Vec<(String, String)>,
    pub elimination_order: Vec<String>,
    pub components: Vec<Vec<usize>>,
    pub big_clique: Option<usize>,
    pub running_intersection: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SepSetReport {
    pub cliques: (usize, usize),
    pub nodes: Vec<String>,
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra.max(rb)] = ra.min(rb);
        true
    }
}

fn intersection(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter()
        .copied()
        .filter(|x| b.binary_search(x).is_ok())
        .collect()
}

impl JunctionTree {
    /// Build the junction tree of `network` with `forced` node ids sharing
    /// one clique.
    pub fn build(network: &Network, forced: &[String]) -> Result<Self> {
        let moral = moralize(network, forced)?;
        let triangulation = triangulate(&moral);
        let cliques = maximal_cliques(&triangulation);

        let mut tree = Self::from_cliques(cliques);
        tree.fill_ins = triangulation.fill_ins;
        tree.elimination_order = triangulation.elimination_order;

        if !forced.is_empty() {
            let members = forced
                .iter()
                .map(|id| network.require_index(id))
                .collect::<Result<Vec<usize>>>()?;
            let big = tree
                .first_clique_containing(&members)
                .ok_or_else(|| Error::MissingBigClique {
                    nodes: forced.to_vec(),
                })?;
            tree.forced = members;
            tree.big_clique = Some(big);
        }

        debug_assert!(tree.verify_running_intersection());
        debug!(
            cliques = tree.cliques.len(),
            sepsets = tree.sepsets.len(),
            components = tree.components.len(),
            fill_ins = tree.fill_ins.len(),
            big_clique = ?tree.big_clique,
            "built junction tree"
        );
        Ok(tree)
    }

    /// Junction forest over already-maximal cliques (each a sorted node list).
    pub fn from_cliques(clique_nodes: Vec<Vec<usize>>) -> Self {
        let cliques: Vec<Clique> = clique_nodes
            .into_iter()
            .enumerate()
            .map(|(id, nodes)| Clique { id, nodes })
            .collect();
        let k = cliques.len();

        let mut candidates = Vec::new();
        for i in 0..k {
            for j in i + 1..k {
                let shared = intersection(&cliques[i].nodes, &cliques[j].nodes);
                if !shared.is_empty() {
                    candidates.push((shared.len(), i, j, shared));
                }
            }
        }
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let mut sets = DisjointSet::new(k);
        let mut sepsets = Vec::new();
        let mut neighbors = vec![Vec::new(); k];
        for (_, i, j, shared) in candidates {
            if sets.union(i, j) {
                let s = sepsets.len();
                sepsets.push(SepSet {
                    cliques: (i, j),
                    nodes: shared,
                });
                neighbors[i].push((j, s));
                neighbors[j].push((i, s));
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }

        let mut component_of = vec![usize::MAX; k];
        let mut components = Vec::new();
        for start in 0..k {
            if component_of[start] != usize::MAX {
                continue;
            }
            let c = components.len();
            let mut members = Vec::new();
            let mut queue = VecDeque::from([start]);
            component_of[start] = c;
            while let Some(x) = queue.pop_front() {
                members.push(x);
                for &(y, _) in &neighbors[x] {
                    if component_of[y] == usize::MAX {
                        component_of[y] = c;
                        queue.push_back(y);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }

        JunctionTree {
            cliques,
            sepsets,
            neighbors,
            components,
            component_of,
            fill_ins: Vec::new(),
            elimination_order: Vec::new(),
            forced: Vec::new(),
            big_clique: None,
        }
    }

    pub fn cliques(&self) -> &[Clique] {
        &self.cliques
    }

    pub fn clique(&self, id: usize) -> &Clique {
        &self.cliques[id]
    }

    pub fn sepsets(&self) -> &[SepSet] {
        &self.sepsets
    }

    /// Adjacent cliques of `id` with the index of the connecting sepset.
    pub fn neighbors(&self, id: usize) -> &[(usize, usize)] {
        &self.neighbors[id]
    }

    /// Connected components as sorted clique id lists, ordered by their
    /// smallest id.
    pub fn components(&self) -> &[Vec<usize>] {
        &self.components
    }

    pub fn component_of(&self, id: usize) -> usize {
        self.component_of[id]
    }

    pub fn fill_ins(&self) -> &[(usize, usize)] {
        &self.fill_ins
    }

    pub fn elimination_order(&self) -> &[usize] {
        &self.elimination_order
    }

    /// Node indices forced into one clique.
    pub fn forced(&self) -> &[usize] {
        &self.forced
    }

    /// Clique holding every forced node, when a forced set was given.
    pub fn big_clique(&self) -> Option<usize> {
        self.big_clique
    }

    /// Sepset on the tree edge `a - b`.
    pub fn sepset_between(&self, a: usize, b: usize) -> Result<&SepSet> {
        self.neighbors[a]
            .iter()
            .find(|(n, _)| *n == b)
            .map(|&(_, s)| &self.sepsets[s])
            .ok_or(Error::MissingSepSet { a, b })
    }

    /// Lowest-id clique containing all of `nodes`.
    pub fn first_clique_containing(&self, nodes: &[usize]) -> Option<usize> {
        self.cliques
            .iter()
            .find(|c| c.contains_all(nodes))
            .map(|c| c.id)
    }

    /// Clique with the fewest nodes containing all of `nodes`; ties go to the
    /// lower id.
    pub fn smallest_clique_containing(&self, nodes: &[usize]) -> Option<usize> {
        self.cliques
            .iter()
            .filter(|c| c.contains_all(nodes))
            .min_by_key(|c| (c.nodes.len(), c.id))
            .map(|c| c.id)
    }

    /// Clique ids on the tree path from `a` to `b`, both included.
    pub fn path(&self, a: usize, b: usize) -> Option<Vec<usize>> {
        if self.component_of[a] != self.component_of[b] {
            return None;
        }
        let mut previous = vec![usize::MAX; self.cliques.len()];
        previous[a] = a;
        let mut queue = VecDeque::from([a]);
        while let Some(x) = queue.pop_front() {
            if x == b {
                break;
            }
            for &(y, _) in &self.neighbors[x] {
                if previous[y] == usize::MAX {
                    previous[y] = x;
                    queue.push_back(y);
                }
            }
        }
        let mut path = vec![b];
        let mut x = b;
        while x != a {
            x = previous[x];
            path.push(x);
        }
        path.reverse();
        Some(path)
    }

    /// True iff, for every node, the cliques containing it form a connected
    /// subtree.
    pub fn verify_running_intersection(&self) -> bool {
        let max_node = self
            .cliques
            .iter()
            .flat_map(|c| c.nodes.iter().copied())
            .max();
        let Some(max_node) = max_node else {
            return true;
        };
        for node in 0..=max_node {
            let holders: Vec<usize> = self
                .cliques
                .iter()
                .filter(|c| c.contains(node))
                .map(|c| c.id)
                .collect();
            let Some(&start) = holders.first() else {
                continue;
            };
            let mut seen = vec![false; self.cliques.len()];
            seen[start] = true;
            let mut reached = 1;
            let mut queue = VecDeque::from([start]);
            while let Some(x) = queue.pop_front() {
                for &(y, _) in &self.neighbors[x] {
                    if !seen[y] && self.cliques[y].contains(node) {
                        seen[y] = true;
                        reached += 1;
                        queue.push_back(y);
                    }
                }
            }
            if reached != holders.len() {
                return false;
            }
        }
        true
    }

    /// Describe the tree with node ids from `network`.
    pub fn report(&self, network: &Network) -> StructureReport {
        let names = |nodes: &[usize]| -> Vec<String> {
            nodes.iter().map(|&n| network.id(n).to_string()).collect()
        };
        StructureReport {
            cliques: self.cliques.iter().map(|c| names(&c.nodes)).collect(),
            sepsets: self
                .sepsets
                .iter()
                .map(|s| SepSetReport {
                    cliques: s.cliques,
                    nodes: names(&s.nodes),
                })
                .collect(),
            fill_ins: self
                .fill_ins
                .iter()
                .map(|&(a, b)| (network.id(a).to_string(), network.id(b).to_string()))
                .collect(),
            elimination_order: names(&self.elimination_order),
            components: self.components.clone(),
            big_clique: self.big_clique,
            running_intersection: self.verify_running_intersection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn binary_root(id: &str) -> serde_json::Value {
        json!({"id": id, "states": ["T", "F"], "cpt": {"T": 0.5, "F": 0.5}})
    }

    fn binary_child(id: &str, parent: &str) -> serde_json::Value {
        json!({"id": id, "states": ["T", "F"], "parents": [parent], "cpt": [
            {"when": {parent: "T"}, "then": {"T": 0.7, "F": 0.3}},
            {"when": {parent: "F"}, "then": {"T": 0.2, "F": 0.8}}
        ]})
    }

    fn chain() -> Network {
        serde_json::from_value(json!([
            binary_root("A"),
            binary_child("B", "A"),
            binary_child("C", "B")
        ]))
        .unwrap()
    }

    #[test]
    fn test_chain_tree() {
        let net = chain();
        let tree = JunctionTree::build(&net, &[]).unwrap();
        assert_eq!(tree.cliques().len(), 2);
        assert_eq!(tree.sepsets().len(), 1);
        assert_eq!(tree.sepsets()[0].nodes, vec![1]);
        assert_eq!(tree.components().len(), 1);
        assert!(tree.big_clique().is_none());
        assert!(tree.verify_running_intersection());
    }

    #[test]
    fn test_forced_clique_merges_chain() {
        let net = chain();
        let tree = JunctionTree::build(&net, &["A".into(), "C".into()]).unwrap();
        assert_eq!(tree.cliques().len(), 1);
        assert_eq!(tree.clique(0).nodes, vec![0, 1, 2]);
        assert_eq!(tree.big_clique(), Some(0));
        assert_eq!(tree.forced(), &[0, 2]);
        assert_eq!(tree.fill_ins().len(), 0);
    }

    #[test]
    fn test_disconnected_network_is_a_forest() {
        let net: Network = serde_json::from_value(json!([
            binary_root("A"),
            binary_child("B", "A"),
            binary_root("X"),
            binary_child("Y", "X")
        ]))
        .unwrap();
        let tree = JunctionTree::build(&net, &[]).unwrap();
        assert_eq!(tree.cliques().len(), 2);
        assert_eq!(tree.sepsets().len(), 0);
        assert_eq!(tree.components().len(), 2);
        assert!(tree.path(0, 1).is_none());
        assert!(tree.sepset_between(0, 1).is_err());
    }

    #[test]
    fn test_kruskal_prefers_heavier_separators() {
        // {0,1,2} - {1,2,3} share two nodes, {2,4} shares one with each
        let tree = JunctionTree::from_cliques(vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 4]]);
        assert_eq!(tree.sepsets().len(), 2);
        assert_eq!(tree.sepsets()[0].cliques, (0, 1));
        assert_eq!(tree.sepsets()[0].nodes, vec![1, 2]);
        // Tie between (0,2) and (1,2): lexicographically smaller pair wins
        assert_eq!(tree.sepsets()[1].cliques, (0, 2));
        assert_eq!(tree.path(1, 2), Some(vec![1, 0, 2]));
        assert!(tree.verify_running_intersection());
    }

    #[test]
    fn test_running_intersection_detects_broken_tree() {
        // Cliques of an unchordal triangle: no spanning tree can satisfy it
        let mut tree = JunctionTree::from_cliques(vec![vec![0, 1], vec![1, 2], vec![0, 2]]);
        assert!(!tree.verify_running_intersection());
        tree.neighbors = vec![vec![(1, 0)], vec![(0, 0), (2, 1)], vec![(1, 1)]];
        assert!(!tree.verify_running_intersection());
    }

    #[test]
    fn test_smallest_clique_lookup() {
        let tree = JunctionTree::from_cliques(vec![vec![0, 1, 2], vec![2, 3]]);
        assert_eq!(tree.smallest_clique_containing(&[2]), Some(1));
        assert_eq!(tree.smallest_clique_containing(&[0, 2]), Some(0));
        assert_eq!(tree.smallest_clique_containing(&[0, 3]), None);
        assert_eq!(tree.first_clique_containing(&[2]), Some(0));
    }

    #[test]
    fn test_report_uses_ids() {
        let net = chain();
        let tree = JunctionTree::build(&net, &[]).unwrap();
        let report = tree.report(&net);
        assert!(report.running_intersection);
        assert_eq!(report.sepsets[0].nodes, vec!["B".to_string()]);
        assert_eq!(report.elimination_order.len(), 3);
    }
}
