//! Evidence validation and preparation for inference.
//!
//! Preparation never edits the caller's [`Evidence`]; it resolves ids to
//! indices and produces new normalized values, split into hard and soft
//! parts.

use jt_common::{Cpt, Error, Evidence, EvidenceValue, Network, Node, Result};
use jt_math::normalize;
use std::collections::BTreeMap;

/// Evidence resolved against a network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedEvidence {
    /// Node index → observed state index.
    pub hard: BTreeMap<usize, usize>,
    /// Node index → normalized weights over the node's states.
    pub soft: BTreeMap<usize, Vec<f64>>,
}

impl PreparedEvidence {
    /// Ids of soft-evidenced nodes, in node index order.
    pub fn soft_ids(&self, network: &Network) -> Vec<String> {
        self.soft.keys().map(|&i| network.id(i).to_string()).collect()
    }

    /// Soft targets as `(node, distribution)` pairs.
    pub fn targets(&self) -> Vec<(usize, Vec<f64>)> {
        self.soft.iter().map(|(&i, w)| (i, w.clone())).collect()
    }

    pub fn has_soft(&self) -> bool {
        !self.soft.is_empty()
    }

    /// Distribution implied for node `i`: one-hot for hard evidence.
    pub fn distribution(&self, network: &Network, i: usize) -> Option<Vec<f64>> {
        if let Some(&state) = self.hard.get(&i) {
            let mut d = vec![0.0; network.cardinality(i)];
            d[state] = 1.0;
            return Some(d);
        }
        self.soft.get(&i).cloned()
    }

    /// True when every node of the network is hard-observed.
    pub fn is_complete_hard(&self, network: &Network) -> bool {
        self.soft.is_empty() && self.hard.len() == network.len()
    }
}

/// Validate `evidence` against `network` and normalize soft weights.
pub fn prepare_evidence(network: &Network, evidence: &Evidence) -> Result<PreparedEvidence> {
    let mut prepared = PreparedEvidence::default();
    for (id, value) in evidence.iter() {
        let node = network.require_index(id)?;
        match value {
            EvidenceValue::Hard(state) => {
                prepared.hard.insert(node, network.require_state(node, state)?);
            }
            EvidenceValue::Soft(weights) => {
                for (state, &weight) in weights {
                    if !weight.is_finite() || weight < 0.0 {
                        return Err(Error::InvalidSoftWeight {
                            node: id.clone(),
                            state: state.clone(),
                            weight,
                        });
                    }
                }
                let mut dist: Vec<f64> = network
                    .states(node)
                    .iter()
                    .map(|s| weights.get(s).copied().unwrap_or(0.0))
                    .collect();
                normalize(&mut dist).ok_or_else(|| Error::ZeroEvidenceMass { node: id.clone() })?;
                prepared.soft.insert(node, dist);
            }
        }
    }
    Ok(prepared)
}

/// Copy of `network` where every evidenced node is a root carrying the
/// normalized evidence distribution.
///
/// This treats the evidence as an authoritative posterior instead of a
/// likelihood. Children of a clamped node keep their CPTs.
pub fn clamp_network(network: &Network, evidence: &Evidence) -> Result<Network> {
    let prepared = prepare_evidence(network, evidence)?;
    let nodes: Vec<Node> = network
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| match prepared.distribution(network, i) {
            Some(dist) => Node {
                id: node.id.clone(),
                states: node.states.clone(),
                parents: Vec::new(),
                cpt: Cpt::Root(node.states.iter().cloned().zip(dist).collect()),
            },
            None => node.clone(),
        })
        .collect();
    Network::new(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair() -> Network {
        serde_json::from_value(json!([
            {"id": "A", "states": ["T", "F"], "cpt": {"T": 0.3, "F": 0.7}},
            {"id": "B", "states": ["x", "y", "z"], "parents": ["A"], "cpt": [
                {"when": {"A": "T"}, "then": {"x": 0.5, "y": 0.25, "z": 0.25}},
                {"when": {"A": "F"}, "then": {"x": 0.1, "y": 0.1, "z": 0.8}}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_soft_weights_normalized_and_defaulted() {
        let net = pair();
        let ev = Evidence::new().soft("B", [("x", 3.0), ("z", 1.0), ("bogus", 9.0)]);
        let prepared = prepare_evidence(&net, &ev).unwrap();
        assert_eq!(prepared.soft[&1], vec![0.75, 0.0, 0.25]);
        assert_eq!(prepared.soft_ids(&net), vec!["B".to_string()]);
        // The input is untouched
        assert!(matches!(ev.get("B"), Some(EvidenceValue::Soft(w)) if w.len() == 3));
    }

    #[test]
    fn test_hard_evidence_resolves() {
        let net = pair();
        let prepared = prepare_evidence(&net, &Evidence::new().hard("A", "F")).unwrap();
        assert_eq!(prepared.hard[&0], 1);
        assert_eq!(prepared.distribution(&net, 0), Some(vec![0.0, 1.0]));
        assert!(!prepared.is_complete_hard(&net));
    }

    #[test]
    fn test_validation_errors() {
        let net = pair();
        assert!(matches!(
            prepare_evidence(&net, &Evidence::new().hard("Q", "T")),
            Err(Error::UnknownNode { .. })
        ));
        assert!(matches!(
            prepare_evidence(&net, &Evidence::new().hard("A", "maybe")),
            Err(Error::UnknownState { .. })
        ));
        assert!(matches!(
            prepare_evidence(&net, &Evidence::new().soft("A", [("T", -1.0)])),
            Err(Error::InvalidSoftWeight { .. })
        ));
        assert!(matches!(
            prepare_evidence(&net, &Evidence::new().soft("A", [("T", f64::NAN)])),
            Err(Error::InvalidSoftWeight { .. })
        ));
        assert!(matches!(
            prepare_evidence(&net, &Evidence::new().soft("A", [("T", 0.0), ("F", 0.0)])),
            Err(Error::ZeroEvidenceMass { .. })
        ));
        assert!(matches!(
            prepare_evidence(&net, &Evidence::new().soft("A", [("bogus", 1.0)])),
            Err(Error::ZeroEvidenceMass { .. })
        ));
    }

    #[test]
    fn test_clamp_makes_roots() {
        let net = pair();
        let clamped = clamp_network(&net, &Evidence::new().soft("B", [("x", 1.0), ("y", 1.0)])).unwrap();
        assert!(clamped.parents(1).is_empty());
        assert_eq!(clamped.family_table(1), &[0.5, 0.5, 0.0]);
        assert_eq!(clamped.family_table(0), net.family_table(0));
    }
}
