//! Initial clique potentials.
//!
//! Every node's CPT is multiplied into exactly one clique: the smallest one
//! covering the node's family. Hard evidence then zeroes the inconsistent
//! rows of every clique containing the observed node.

use jt_common::{Error, Network, Result};
use std::collections::BTreeMap;
use tracing::trace;

use super::potential::Potential;
use crate::structure::JunctionTree;

/// Clique id receiving each node's CPT.
pub fn factor_assignment(network: &Network, tree: &JunctionTree) -> Result<Vec<usize>> {
    (0..network.len())
        .map(|i| {
            tree.smallest_clique_containing(&network.family(i))
                .ok_or_else(|| Error::MissingFamilyClique {
                    node: network.id(i).to_string(),
                })
        })
        .collect()
}

/// Clique potentials before propagation.
///
/// `hard` maps node index to observed state index.
pub fn initial_potentials(
    network: &Network,
    tree: &JunctionTree,
    hard: &BTreeMap<usize, usize>,
) -> Result<Vec<Potential>> {
    let mut potentials: Vec<Potential> = tree
        .cliques()
        .iter()
        .map(|c| Potential::unit(network, &c.nodes))
        .collect();

    for (node, clique) in factor_assignment(network, tree)?.into_iter().enumerate() {
        trace!(node = network.id(node), clique, "assigning CPT");
        potentials[clique].multiply_factor(&network.family(node), network.family_table(node));
    }

    for (&node, &state) in hard {
        for potential in potentials.iter_mut() {
            potential.restrict(node, state);
        }
    }
    Ok(potentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain() -> Network {
        serde_json::from_value(json!([
            {"id": "A", "states": ["T", "F"], "cpt": {"T": 0.3, "F": 0.7}},
            {"id": "B", "states": ["T", "F"], "parents": ["A"], "cpt": [
                {"when": {"A": "T"}, "then": {"T": 0.9, "F": 0.1}},
                {"when": {"A": "F"}, "then": {"T": 0.2, "F": 0.8}}
            ]},
            {"id": "C", "states": ["T", "F"], "parents": ["B"], "cpt": [
                {"when": {"B": "T"}, "then": {"T": 0.6, "F": 0.4}},
                {"when": {"B": "F"}, "then": {"T": 0.5, "F": 0.5}}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_every_cpt_assigned_once() {
        let net = chain();
        let tree = JunctionTree::build(&net, &[]).unwrap();
        let assignment = factor_assignment(&net, &tree).unwrap();
        assert_eq!(assignment.len(), 3);
        let potentials = initial_potentials(&net, &tree, &BTreeMap::new()).unwrap();
        // Product of all potentials is the joint, which sums to 1
        let total: f64 = potentials
            .iter()
            .map(|p| p.total())
            .product::<f64>();
        assert!(total > 0.0);
        let ab = tree.smallest_clique_containing(&[0, 1]).unwrap();
        assert_eq!(assignment[0], ab);
        assert_eq!(assignment[1], ab);
    }

    #[test]
    fn test_hard_evidence_zeroes_rows() {
        let net = chain();
        let tree = JunctionTree::build(&net, &[]).unwrap();
        let hard = BTreeMap::from([(1, 1)]);
        let potentials = initial_potentials(&net, &tree, &hard).unwrap();
        for p in &potentials {
            let marginal = p.marginalize(&[1]);
            assert_eq!(marginal.values()[0], 0.0);
        }
    }

    #[test]
    fn test_missing_family_clique() {
        let net = chain();
        // Cliques that split the family of B
        let tree = JunctionTree::from_cliques(vec![vec![0], vec![1, 2]]);
        assert!(matches!(
            factor_assignment(&net, &tree),
            Err(Error::MissingFamilyClique { ref node }) if node == "B"
        ));
    }
}
