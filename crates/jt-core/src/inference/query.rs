//! Probability queries against calibrated clique potentials.

use jt_common::{Combination, Error, Network, Result};

use super::potential::Potential;
use crate::structure::JunctionTree;

/// `P(combination | evidence)` read from the smallest clique spanning every
/// queried node.
///
/// Potentials must be calibrated, though not necessarily normalized. An empty
/// combination has probability 1.
pub fn query_probability(
    network: &Network,
    tree: &JunctionTree,
    potentials: &[Potential],
    combination: &Combination,
) -> Result<f64> {
    let mut pairs = Vec::with_capacity(combination.len());
    for (id, state) in combination {
        let node = network.require_index(id)?;
        pairs.push((node, network.require_state(node, state)?));
    }
    if pairs.is_empty() {
        return Ok(1.0);
    }

    let nodes: Vec<usize> = pairs.iter().map(|&(n, _)| n).collect();
    let clique = tree
        .smallest_clique_containing(&nodes)
        .ok_or_else(|| Error::QueryNotCovered {
            nodes: combination.keys().cloned().collect(),
        })?;
    let potential = &potentials[clique];
    let total = potential.total();
    if total <= 0.0 {
        return Err(Error::ImpossibleEvidence);
    }
    Ok(potential.matching_mass(&pairs) / total)
}

/// Posterior distribution of node `node`.
pub fn node_marginal(tree: &JunctionTree, potentials: &[Potential], node: usize) -> Result<Vec<f64>> {
    let clique = tree
        .smallest_clique_containing(&[node])
        .ok_or(Error::QueryNotCovered { nodes: Vec::new() })?;
    let mut marginal = potentials[clique].marginalize(&[node]);
    marginal.normalize().ok_or(Error::ImpossibleEvidence)?;
    Ok(marginal.values().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::assemble::initial_potentials;
    use crate::inference::propagate::propagate;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn setup() -> (Network, JunctionTree, Vec<Potential>) {
        let net: Network = serde_json::from_value(json!([
            {"id": "A", "states": ["T", "F"], "cpt": {"T": 0.3, "F": 0.7}},
            {"id": "B", "states": ["x", "y", "z"], "parents": ["A"], "cpt": [
                {"when": {"A": "T"}, "then": {"x": 0.5, "y": 0.25, "z": 0.25}},
                {"when": {"A": "F"}, "then": {"x": 0.1, "y": 0.1, "z": 0.8}}
            ]},
            {"id": "C", "states": ["T", "F"], "parents": ["B"], "cpt": [
                {"when": {"B": "x"}, "then": {"T": 1.0, "F": 0.0}},
                {"when": {"B": "y"}, "then": {"T": 0.5, "F": 0.5}},
                {"when": {"B": "z"}, "then": {"T": 0.0, "F": 1.0}}
            ]}
        ]))
        .unwrap();
        let tree = JunctionTree::build(&net, &[]).unwrap();
        let mut pots = initial_potentials(&net, &tree, &BTreeMap::new()).unwrap();
        propagate(&tree, &mut pots, None).unwrap();
        (net, tree, pots)
    }

    fn combo(pairs: &[(&str, &str)]) -> Combination {
        pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    #[test]
    fn test_joint_and_marginal_queries() {
        let (net, tree, pots) = setup();
        let p = query_probability(&net, &tree, &pots, &combo(&[("A", "T"), ("B", "x")])).unwrap();
        assert!((p - 0.15).abs() < 1e-12);
        let p = query_probability(&net, &tree, &pots, &combo(&[("B", "z")])).unwrap();
        assert!((p - (0.075 + 0.56)).abs() < 1e-12);
        let m = node_marginal(&tree, &pots, 2).unwrap();
        // P(C=T) = P(B=x) + 0.5 P(B=y)
        assert!((m[0] - (0.22 + 0.5 * 0.145)).abs() < 1e-12);
        assert_eq!(query_probability(&net, &tree, &pots, &Combination::new()).unwrap(), 1.0);
    }

    #[test]
    fn test_query_errors() {
        let (net, tree, pots) = setup();
        assert!(matches!(
            query_probability(&net, &tree, &pots, &combo(&[("A", "T"), ("C", "T")])),
            Err(Error::QueryNotCovered { .. })
        ));
        assert!(matches!(
            query_probability(&net, &tree, &pots, &combo(&[("Q", "T")])),
            Err(Error::UnknownNode { .. })
        ));
        assert!(matches!(
            query_probability(&net, &tree, &pots, &combo(&[("B", "w")])),
            Err(Error::UnknownState { .. })
        ));
    }
}
