//! Evidence and state combinations.
//!
//! Evidence maps a node id to either a hard state or a soft weight map. Both
//! forms share one untagged JSON encoding:
//!
//! ```json
//! { "ALARM": "T", "RAIN": { "T": 3, "F": 7 } }
//! ```
//!
//! Evidence values are immutable inputs: preparation for inference produces
//! new normalized values and never edits these maps.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::signature::content_hash;

/// Assignment of states to a subset of nodes: node id → state.
pub type Combination = BTreeMap<String, String>;

/// Observation of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum EvidenceValue {
    /// The node is known to be in this state.
    Hard(String),
    /// Non-negative weights over the node's states; missing states weigh 0.
    Soft(BTreeMap<String, f64>),
}

/// Evidence over a set of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Evidence(BTreeMap<String, EvidenceValue>);

impl Evidence {
    /// Empty evidence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add hard evidence.
    pub fn hard(mut self, node: impl Into<String>, state: impl Into<String>) -> Self {
        self.0.insert(node.into(), EvidenceValue::Hard(state.into()));
        self
    }

    /// Add soft evidence.
    pub fn soft<K: Into<String>>(
        mut self,
        node: impl Into<String>,
        weights: impl IntoIterator<Item = (K, f64)>,
    ) -> Self {
        let weights = weights.into_iter().map(|(k, w)| (k.into(), w)).collect();
        self.0.insert(node.into(), EvidenceValue::Soft(weights));
        self
    }

    /// Insert or replace the observation of `node`.
    pub fn insert(&mut self, node: impl Into<String>, value: EvidenceValue) {
        self.0.insert(node.into(), value);
    }

    /// Observation of `node`, if any.
    pub fn get(&self, node: &str) -> Option<&EvidenceValue> {
        self.0.get(node)
    }

    /// Observations in node-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &EvidenceValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Content hash used as the evidence half of inference cache keys.
    pub fn content_hash(&self) -> Result<String> {
        content_hash(&self.0)
    }
}

impl FromIterator<(String, EvidenceValue)> for Evidence {
    fn from_iter<I: IntoIterator<Item = (String, EvidenceValue)>>(iter: I) -> Self {
        Evidence(iter.into_iter().collect())
    }
}

impl From<&Combination> for Evidence {
    fn from(combination: &Combination) -> Self {
        combination
            .iter()
            .map(|(node, state)| (node.clone(), EvidenceValue::Hard(state.clone())))
            .collect()
    }
}
