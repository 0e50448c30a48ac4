//! Discrete Bayesian network model.
//!
//! A [`Network`] is built once from a list of [`Node`] declarations and is
//! immutable afterwards. Construction validates the whole structure so the
//! inference code can rely on it:
//! - node ids are unique and every parent resolves
//! - every node has at least two distinct states
//! - the graph is acyclic
//! - every CPT covers each parent context exactly once with a distribution
//!   summing to 1
//!
//! Alongside the declarations the network keeps each CPT compiled into a dense
//! family table laid out over `(parents..., node)` in declaration order, with
//! the node's own state varying fastest.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::error::{Error, Result};
use crate::signature::content_hash;

/// Tolerance for a CPT distribution to count as summing to 1.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// A discrete random variable with its conditional probability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    /// Unique node identifier.
    pub id: String,
    /// Ordered states; the order fixes table indexing.
    pub states: Vec<String>,
    /// Parent node identifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    /// Conditional probability table.
    pub cpt: Cpt,
}

/// Conditional probability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Cpt {
    /// Distribution of a parentless node: state → probability.
    Root(BTreeMap<String, f64>),
    /// One row per parent-state combination.
    Conditional(Vec<CptRow>),
}

/// A single row of a conditional CPT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CptRow {
    /// Parent id → parent state.
    pub when: BTreeMap<String, String>,
    /// Node state → probability.
    pub then: BTreeMap<String, f64>,
}

/// A validated, immutable Bayesian network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Node>", into = "Vec<Node>")]
pub struct Network {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
    tables: Vec<Vec<f64>>,
    topological: Vec<usize>,
    signature: String,
    structure_signature: String,
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl TryFrom<Vec<Node>> for Network {
    type Error = Error;

    fn try_from(nodes: Vec<Node>) -> Result<Self> {
        Network::new(nodes)
    }
}

impl From<Network> for Vec<Node> {
    fn from(network: Network) -> Self {
        network.nodes
    }
}

/// Mixed-radix index of `states` over `cards`, first position slowest.
pub fn context_index(cards: &[usize], states: &[usize]) -> usize {
    cards
        .iter()
        .zip(states)
        .fold(0, |acc, (card, state)| acc * card + state)
}

/// Inverse of [`context_index`].
pub fn decode_context(cards: &[usize], mut index: usize) -> Vec<usize> {
    let mut states = vec![0; cards.len()];
    for (slot, card) in states.iter_mut().zip(cards).rev() {
        *slot = index % card;
        index /= card;
    }
    states
}

impl Network {
    /// Validate `nodes` and build the network.
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::EmptyNetwork);
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(Error::DuplicateNode {
                    node: node.id.clone(),
                });
            }
        }

        for node in &nodes {
            if node.states.len() < 2 {
                return Err(Error::TooFewStates {
                    node: node.id.clone(),
                    count: node.states.len(),
                });
            }
            for (i, state) in node.states.iter().enumerate() {
                if node.states[..i].contains(state) {
                    return Err(Error::DuplicateState {
                        node: node.id.clone(),
                        state: state.clone(),
                    });
                }
            }
        }

        let mut parents = Vec::with_capacity(nodes.len());
        let mut children = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            let mut resolved = Vec::with_capacity(node.parents.len());
            for parent in &node.parents {
                let p = *index.get(parent).ok_or_else(|| Error::UnknownParent {
                    node: node.id.clone(),
                    parent: parent.clone(),
                })?;
                if p == i {
                    return Err(Error::CyclicGraph {
                        node: node.id.clone(),
                    });
                }
                if resolved.contains(&p) {
                    return Err(Error::MalformedCpt {
                        node: node.id.clone(),
                        message: format!("parent '{}' listed twice", parent),
                    });
                }
                resolved.push(p);
                children[p].push(i);
            }
            parents.push(resolved);
        }

        let topological = topological_order(&nodes, &parents, &children)?;

        let mut tables = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            tables.push(compile_cpt(&nodes, &parents[i], node)?);
        }

        let signature = content_hash(&nodes)?;
        let shape: Vec<(&str, &[String], &[String])> = nodes
            .iter()
            .map(|n| (n.id.as_str(), n.states.as_slice(), n.parents.as_slice()))
            .collect();
        let structure_signature = content_hash(&shape)?;

        Ok(Network {
            nodes,
            index,
            parents,
            children,
            tables,
            topological,
            signature,
            structure_signature,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: construction rejects empty networks.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node declarations in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node declaration by index.
    pub fn node(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    /// Node identifier by index.
    pub fn id(&self, i: usize) -> &str {
        &self.nodes[i].id
    }

    /// Index of a node id, if present.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Index of a node id, failing with [`Error::UnknownNode`].
    pub fn require_index(&self, id: &str) -> Result<usize> {
        self.index_of(id).ok_or_else(|| Error::UnknownNode {
            node: id.to_string(),
        })
    }

    /// Ordered states of node `i`.
    pub fn states(&self, i: usize) -> &[String] {
        &self.nodes[i].states
    }

    /// Number of states of node `i`.
    pub fn cardinality(&self, i: usize) -> usize {
        self.nodes[i].states.len()
    }

    /// Index of `state` within node `i`, if present.
    pub fn state_index(&self, i: usize, state: &str) -> Option<usize> {
        self.nodes[i].states.iter().position(|s| s == state)
    }

    /// Index of `state` within node `i`, failing with [`Error::UnknownState`].
    pub fn require_state(&self, i: usize, state: &str) -> Result<usize> {
        self.state_index(i, state).ok_or_else(|| Error::UnknownState {
            node: self.nodes[i].id.clone(),
            state: state.to_string(),
        })
    }

    /// Parent indices of node `i` in declaration order.
    pub fn parents(&self, i: usize) -> &[usize] {
        &self.parents[i]
    }

    /// Child indices of node `i`.
    pub fn children(&self, i: usize) -> &[usize] {
        &self.children[i]
    }

    /// Family of node `i`: its parents followed by the node itself.
    ///
    /// This is the variable order of [`Network::family_table`].
    pub fn family(&self, i: usize) -> Vec<usize> {
        let mut family = self.parents[i].clone();
        family.push(i);
        family
    }

    /// Node indices with every parent before its children.
    pub fn topological_order(&self) -> &[usize] {
        &self.topological
    }

    /// Dense CPT of node `i` over [`Network::family`].
    pub fn family_table(&self, i: usize) -> &[f64] {
        &self.tables[i]
    }

    /// Number of parent contexts of node `i`.
    pub fn context_count(&self, i: usize) -> usize {
        self.parents[i]
            .iter()
            .map(|&p| self.cardinality(p))
            .product()
    }

    /// `P(node i = state | parents = parent_states)`.
    pub fn probability(&self, i: usize, parent_states: &[usize], state: usize) -> f64 {
        let cards: Vec<usize> = self.parents[i].iter().map(|&p| self.cardinality(p)).collect();
        let context = context_index(&cards, parent_states);
        self.tables[i][context * self.cardinality(i) + state]
    }

    /// Human-readable label of parent context `context` of node `i`.
    pub fn context_label(&self, i: usize, context: usize) -> String {
        let cards: Vec<usize> = self.parents[i].iter().map(|&p| self.cardinality(p)).collect();
        let states = decode_context(&cards, context);
        let parts: Vec<String> = self.parents[i]
            .iter()
            .zip(states)
            .map(|(&p, s)| format!("{}={}", self.id(p), self.states(p)[s]))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    /// SHA-256 content signature of the node declarations.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// SHA-256 of ids, states and parents only; unchanged by CPT edits.
    pub fn structure_signature(&self) -> &str {
        &self.structure_signature
    }

    /// Build a new network with the same structure and replaced CPTs.
    ///
    /// `tables[i]` must use the layout of [`Network::family_table`]. The
    /// result is validated like any other network.
    pub fn with_family_tables(&self, tables: &[Vec<f64>]) -> Result<Network> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let table = tables.get(i).ok_or_else(|| Error::MalformedCpt {
                node: node.id.clone(),
                message: "no replacement table supplied".into(),
            })?;
            let card = self.cardinality(i);
            let contexts = self.context_count(i);
            if table.len() != card * contexts {
                return Err(Error::MalformedCpt {
                    node: node.id.clone(),
                    message: format!(
                        "replacement table has {} entries, expected {}",
                        table.len(),
                        card * contexts
                    ),
                });
            }
            let row_map = |row: &[f64]| -> BTreeMap<String, f64> {
                node.states.iter().cloned().zip(row.iter().copied()).collect()
            };
            let cpt = if self.parents[i].is_empty() {
                Cpt::Root(row_map(table))
            } else {
                let cards: Vec<usize> =
                    self.parents[i].iter().map(|&p| self.cardinality(p)).collect();
                let rows = table
                    .chunks(card)
                    .enumerate()
                    .map(|(context, row)| {
                        let when = self.parents[i]
                            .iter()
                            .zip(decode_context(&cards, context))
                            .map(|(&p, s)| (self.id(p).to_string(), self.states(p)[s].clone()))
                            .collect();
                        CptRow {
                            when,
                            then: row_map(row),
                        }
                    })
                    .collect();
                Cpt::Conditional(rows)
            };
            nodes.push(Node {
                id: node.id.clone(),
                states: node.states.clone(),
                parents: node.parents.clone(),
                cpt,
            });
        }
        Network::new(nodes)
    }
}

fn topological_order(
    nodes: &[Node],
    parents: &[Vec<usize>],
    children: &[Vec<usize>],
) -> Result<Vec<usize>> {
    let mut in_degree: Vec<usize> = parents.iter().map(Vec::len).collect();
    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(i) = queue.pop_front() {
        order.push(i);
        for &child in &children[i] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if order.len() != nodes.len() {
        let stuck = (0..nodes.len())
            .find(|&i| in_degree[i] > 0)
            .unwrap_or_default();
        return Err(Error::CyclicGraph {
            node: nodes[stuck].id.clone(),
        });
    }
    Ok(order)
}

fn compile_cpt(
    nodes: &[Node],
    parents: &[usize],
    node: &Node,
) -> Result<Vec<f64>> {
    let card = node.states.len();
    let cards: Vec<usize> = parents.iter().map(|&p| nodes[p].states.len()).collect();
    let contexts: usize = cards.iter().product();
    let mut table = vec![0.0; contexts * card];

    let malformed = |message: String| Error::MalformedCpt {
        node: node.id.clone(),
        message,
    };

    match &node.cpt {
        Cpt::Root(dist) => {
            if !parents.is_empty() {
                return Err(malformed(
                    "flat distribution given for a node with parents".into(),
                ));
            }
            fill_row(node, dist, "{}", &mut table)?;
        }
        Cpt::Conditional(rows) => {
            if rows.len() != contexts {
                return Err(malformed(format!(
                    "expected {} rows, found {}",
                    contexts,
                    rows.len()
                )));
            }
            let mut seen = vec![false; contexts];
            for row in rows {
                if row.when.len() != parents.len() {
                    return Err(malformed(format!(
                        "row conditions on {} node(s), expected {}",
                        row.when.len(),
                        parents.len()
                    )));
                }
                let mut states = Vec::with_capacity(parents.len());
                for &p in parents {
                    let parent = &nodes[p];
                    let state = row.when.get(&parent.id).ok_or_else(|| {
                        malformed(format!("row does not condition on parent '{}'", parent.id))
                    })?;
                    let s = parent
                        .states
                        .iter()
                        .position(|x| x == state)
                        .ok_or_else(|| Error::UnknownState {
                            node: parent.id.clone(),
                            state: state.clone(),
                        })?;
                    states.push(s);
                }
                let context = context_index(&cards, &states);
                if seen[context] {
                    return Err(malformed(format!(
                        "context {:?} appears more than once",
                        row.when
                    )));
                }
                seen[context] = true;
                let label = format!("{:?}", row.when);
                fill_row(
                    node,
                    &row.then,
                    &label,
                    &mut table[context * card..(context + 1) * card],
                )?;
            }
        }
    }
    Ok(table)
}

fn fill_row(node: &Node, dist: &BTreeMap<String, f64>, context: &str, out: &mut [f64]) -> Result<()> {
    for key in dist.keys() {
        if !node.states.contains(key) {
            return Err(Error::UnknownState {
                node: node.id.clone(),
                state: key.clone(),
            });
        }
    }
    for (slot, state) in out.iter_mut().zip(&node.states) {
        let p = *dist.get(state).ok_or_else(|| Error::MalformedCpt {
            node: node.id.clone(),
            message: format!("context {} has no probability for state '{}'", context, state),
        })?;
        if !p.is_finite() || p < 0.0 {
            return Err(Error::MalformedCpt {
                node: node.id.clone(),
                message: format!("invalid probability {} for state '{}'", p, state),
            });
        }
        *slot = p;
    }
    let sum: f64 = out.iter().sum();
    if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(Error::InvalidDistribution {
            node: node.id.clone(),
            context: context.to_string(),
            sum,
        });
    }
    Ok(())
}
