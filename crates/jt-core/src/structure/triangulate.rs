//! Greedy min-fill triangulation and clique extraction.

use std::collections::BTreeSet;
use tracing::debug;

use super::graph::UndirectedGraph;

/// Result of eliminating every vertex of a graph.
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// The input graph plus every fill-in edge; chordal.
    pub graph: UndirectedGraph,
    /// Added edges as `(low, high)` pairs, in the order they were added.
    pub fill_ins: Vec<(usize, usize)>,
    /// Vertices in elimination order (a perfect elimination ordering of
    /// `graph`).
    pub elimination_order: Vec<usize>,
    /// For each eliminated vertex, the sorted set of it and its neighbours
    /// still present at elimination time.
    pub elimination_cliques: Vec<Vec<usize>>,
}

/// Number of missing edges among `neighbors`.
fn fill_cost(work: &[BTreeSet<usize>], neighbors: &BTreeSet<usize>) -> usize {
    let ns: Vec<usize> = neighbors.iter().copied().collect();
    let mut missing = 0;
    for (i, &a) in ns.iter().enumerate() {
        for &b in &ns[i + 1..] {
            if !work[a].contains(&b) {
                missing += 1;
            }
        }
    }
    missing
}

/// Triangulate `graph` by greedy min-fill elimination.
///
/// At each step the remaining vertex whose elimination adds the fewest fill-in
/// edges is removed. Ties go to the vertex with fewer remaining neighbours,
/// then to the lower index, which keeps the result deterministic.
pub fn triangulate(graph: &UndirectedGraph) -> Triangulation {
    let n = graph.len();
    let mut work: Vec<BTreeSet<usize>> = (0..n).map(|v| graph.neighbors(v).clone()).collect();
    let mut eliminated = vec![false; n];
    let mut chordal = graph.clone();
    let mut fill_ins = Vec::new();
    let mut elimination_order = Vec::with_capacity(n);
    let mut elimination_cliques = Vec::with_capacity(n);

    for _ in 0..n {
        let Some(v) = (0..n)
            .filter(|&v| !eliminated[v])
            .min_by_key(|&v| (fill_cost(&work, &work[v]), work[v].len(), v))
        else {
            break;
        };

        let neighbors: Vec<usize> = work[v].iter().copied().collect();
        for (i, &a) in neighbors.iter().enumerate() {
            for &b in &neighbors[i + 1..] {
                if work[a].insert(b) {
                    work[b].insert(a);
                    chordal.add_edge(a, b);
                    fill_ins.push((a.min(b), a.max(b)));
                }
            }
        }

        let mut clique = neighbors.clone();
        clique.push(v);
        clique.sort_unstable();
        elimination_cliques.push(clique);

        for &u in &neighbors {
            work[u].remove(&v);
        }
        work[v].clear();
        eliminated[v] = true;
        elimination_order.push(v);
    }

    debug!(
        vertices = n,
        fill_ins = fill_ins.len(),
        "triangulated graph"
    );

    Triangulation {
        graph: chordal,
        fill_ins,
        elimination_order,
        elimination_cliques,
    }
}

fn is_subset(small: &[usize], large: &[usize]) -> bool {
    small.len() <= large.len() && small.iter().all(|v| large.binary_search(v).is_ok())
}

/// Maximal cliques of a triangulated graph from its elimination cliques.
///
/// Every maximal clique of a chordal graph appears among the elimination
/// cliques of a perfect elimination ordering; the rest are subsets of some
/// other candidate. The result keeps elimination order.
pub fn maximal_cliques(triangulation: &Triangulation) -> Vec<Vec<usize>> {
    let candidates = &triangulation.elimination_cliques;
    candidates
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            !candidates
                .iter()
                .enumerate()
                .any(|(j, other)| *i != j && is_subset(c, other) && (c.len() < other.len() || j < *i))
        })
        .map(|(_, c)| c.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(n: usize, edges: &[(usize, usize)]) -> UndirectedGraph {
        let mut g = UndirectedGraph::new(n);
        for &(a, b) in edges {
            g.add_edge(a, b);
        }
        g
    }

    #[test]
    fn test_chain_needs_no_fill() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 3)]);
        let t = triangulate(&g);
        assert!(t.fill_ins.is_empty());
        assert_eq!(t.elimination_order.len(), 4);
        assert_eq!(
            maximal_cliques(&t),
            vec![vec![0, 1], vec![1, 2], vec![2, 3]]
        );
    }

    #[test]
    fn test_four_cycle_gets_one_chord() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let t = triangulate(&g);
        assert_eq!(t.fill_ins.len(), 1);
        assert!(t.graph.is_chordal());
        let cliques = maximal_cliques(&t);
        assert_eq!(cliques.len(), 2);
        assert!(cliques.iter().all(|c| c.len() == 3));
    }

    #[test]
    fn test_complete_graph_is_one_clique() {
        let g = graph(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        let t = triangulate(&g);
        assert!(t.fill_ins.is_empty());
        assert_eq!(maximal_cliques(&t), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_isolated_vertices_form_singleton_cliques() {
        let g = graph(3, &[(0, 1)]);
        let t = triangulate(&g);
        let cliques = maximal_cliques(&t);
        assert!(cliques.contains(&vec![0, 1]));
        assert!(cliques.contains(&vec![2]));
        assert_eq!(cliques.len(), 2);
    }

    #[test]
    fn test_fill_ins_are_recorded_in_graph() {
        // 5-cycle needs two chords
        let g = graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        let t = triangulate(&g);
        assert_eq!(t.fill_ins.len(), 2);
        for &(a, b) in &t.fill_ins {
            assert!(t.graph.has_edge(a, b));
            assert!(!g.has_edge(a, b));
        }
        assert!(t.graph.is_chordal());
    }
}
