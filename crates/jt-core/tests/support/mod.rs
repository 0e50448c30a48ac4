//! Shared fixtures for integration tests.

#![allow(dead_code)]

use jt_common::{Cpt, CptRow, Network, Node};
use std::collections::BTreeMap;

pub const TOLERANCE: f64 = 1e-6;

pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Binary T/F root with `P(T) = p`.
pub fn binary_root(id: &str, p: f64) -> Node {
    Node {
        id: id.to_string(),
        states: vec!["T".into(), "F".into()],
        parents: Vec::new(),
        cpt: Cpt::Root(BTreeMap::from([("T".to_string(), p), ("F".to_string(), 1.0 - p)])),
    }
}

/// Binary T/F node with binary parents.
///
/// `p_true` lists `P(T | parents)` with the first parent varying slowest
/// and `T` before `F`.
pub fn binary_child(id: &str, parents: &[&str], p_true: &[f64]) -> Node {
    assert_eq!(p_true.len(), 1 << parents.len());
    let rows = p_true
        .iter()
        .enumerate()
        .map(|(index, &p)| {
            let when = parents
                .iter()
                .enumerate()
                .map(|(k, parent)| {
                    let bit = (index >> (parents.len() - 1 - k)) & 1;
                    (parent.to_string(), if bit == 0 { "T" } else { "F" }.to_string())
                })
                .collect();
            CptRow {
                when,
                then: BTreeMap::from([("T".to_string(), p), ("F".to_string(), 1.0 - p)]),
            }
        })
        .collect();
    Node {
        id: id.to_string(),
        states: vec!["T".into(), "F".into()],
        parents: parents.iter().map(|p| p.to_string()).collect(),
        cpt: Cpt::Conditional(rows),
    }
}

/// Pearl's burglary network.
pub fn alarm() -> Network {
    Network::new(vec![
        binary_root("BURGLARY", 0.001),
        binary_root("EARTHQUAKE", 0.002),
        binary_child("ALARM", &["BURGLARY", "EARTHQUAKE"], &[0.95, 0.94, 0.29, 0.001]),
        binary_child("JOHN_CALLS", &["ALARM"], &[0.90, 0.05]),
        binary_child("MARY_CALLS", &["ALARM"], &[0.70, 0.01]),
    ])
    .expect("alarm network is valid")
}

/// Cloudy, sprinkler, rain, wet grass.
pub fn sprinkler() -> Network {
    Network::new(vec![
        binary_root("CLOUDY", 0.5),
        binary_child("SPRINKLER", &["CLOUDY"], &[0.1, 0.5]),
        binary_child("RAIN", &["CLOUDY"], &[0.8, 0.2]),
        binary_child("WET_GRASS", &["SPRINKLER", "RAIN"], &[0.99, 0.9, 0.9, 0.0]),
    ])
    .expect("sprinkler network is valid")
}

/// `A -> B -> C` with uniform CPTs.
pub fn uniform_chain() -> Network {
    Network::new(vec![
        binary_root("A", 0.5),
        binary_child("B", &["A"], &[0.5, 0.5]),
        binary_child("C", &["B"], &[0.5, 0.5]),
    ])
    .expect("chain network is valid")
}

/// Network over `cards.len()` nodes named `N0, N1, ...` with states `s0, s1, ...`.
///
/// Node `i` takes as parents every `j < i` with `edges[i][j]` set, at most
/// three of them. CPT rows are the normalized `weights`, read cyclically.
pub fn random_network(cards: &[usize], edges: &[Vec<bool>], weights: &[f64]) -> Network {
    let name = |i: usize| format!("N{}", i);
    let state = |k: usize| format!("s{}", k);
    let mut cursor = 0;
    let mut next_weight = || {
        let w = weights[cursor % weights.len()];
        cursor += 1;
        w
    };

    let mut nodes = Vec::with_capacity(cards.len());
    for (i, &card) in cards.iter().enumerate() {
        let parents: Vec<usize> = (0..i).filter(|&j| edges[i][j]).take(3).collect();
        let states: Vec<String> = (0..card).map(state).collect();

        let mut row = || -> BTreeMap<String, f64> {
            let raw: Vec<f64> = (0..card).map(|_| next_weight()).collect();
            let total: f64 = raw.iter().sum();
            raw.iter()
                .enumerate()
                .map(|(k, w)| (state(k), w / total))
                .collect()
        };

        let cpt = if parents.is_empty() {
            Cpt::Root(row())
        } else {
            let parent_cards: Vec<usize> = parents.iter().map(|&p| cards[p]).collect();
            let contexts: usize = parent_cards.iter().product();
            let rows = (0..contexts)
                .map(|mut index| {
                    let mut when = BTreeMap::new();
                    for (&p, &pc) in parents.iter().zip(&parent_cards).rev() {
                        when.insert(name(p), state(index % pc));
                        index /= pc;
                    }
                    CptRow { when, then: row() }
                })
                .collect();
            Cpt::Conditional(rows)
        };

        nodes.push(Node {
            id: name(i),
            states,
            parents: parents.iter().map(|&p| name(p)).collect(),
            cpt,
        });
    }
    Network::new(nodes).expect("generated network is valid")
}
