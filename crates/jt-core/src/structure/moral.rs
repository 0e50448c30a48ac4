//! Moralization and forced cliques.

use jt_common::{Error, Network, Result};
use tracing::debug;

use super::graph::UndirectedGraph;

/// Moral graph of `network`, with `forced` node ids fully connected.
///
/// Every pair of co-parents is married. The forced set becomes a clique so
/// that one clique of the final tree jointly holds all of those nodes; this
/// is how several soft-evidence nodes end up in a single big clique.
pub fn moralize(network: &Network, forced: &[String]) -> Result<UndirectedGraph> {
    let mut graph = UndirectedGraph::from_network(network);

    let mut married = 0usize;
    for child in 0..network.len() {
        let parents = network.parents(child);
        for (i, &a) in parents.iter().enumerate() {
            for &b in &parents[i + 1..] {
                if graph.add_edge(a, b) {
                    married += 1;
                }
            }
        }
    }

    let members = forced
        .iter()
        .map(|id| {
            network
                .index_of(id)
                .ok_or_else(|| Error::ForcedCliqueNodeMissing { node: id.clone() })
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut forced_edges = 0usize;
    for (i, &a) in members.iter().enumerate() {
        for &b in &members[i + 1..] {
            if graph.add_edge(a, b) {
                forced_edges += 1;
            }
        }
    }

    debug!(
        nodes = network.len(),
        edges = graph.edge_count(),
        married,
        forced_edges,
        "moralized network"
    );
    Ok(graph)
}
