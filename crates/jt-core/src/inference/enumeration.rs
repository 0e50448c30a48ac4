//! Brute-force inference over the full joint distribution.
//!
//! Exponential in the number of nodes, so it is guarded by a state-count
//! limit. Hard evidence filters the joint; soft evidence is fitted with the
//! same IPFP used on the big clique. The scale factors depend only on the
//! soft-evidence variables, so both engines agree at convergence. Unlike the
//! junction tree this engine answers queries over any node subset.

use jt_common::{Combination, Error, Evidence, Network, Result};

use super::engine::{Inference, Marginals};
use super::ipfp::{self, IpfpSettings};
use super::potential::Potential;
use crate::evidence::prepare_evidence;

/// Default cap on joint-table entries.
pub const DEFAULT_MAX_STATES: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct EnumerationEngine {
    settings: IpfpSettings,
    max_states: usize,
}

impl Default for EnumerationEngine {
    fn default() -> Self {
        Self::new(IpfpSettings::default())
    }
}

impl EnumerationEngine {
    pub fn new(settings: IpfpSettings) -> Self {
        Self {
            settings,
            max_states: DEFAULT_MAX_STATES,
        }
    }

    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }

    /// Normalized joint posterior over all nodes, in node index order.
    pub fn posterior(&self, network: &Network, evidence: &Evidence) -> Result<Potential> {
        let prepared = prepare_evidence(network, evidence)?;

        let size = (0..network.len())
            .try_fold(1usize, |acc, i| acc.checked_mul(network.cardinality(i)))
            .filter(|&s| s <= self.max_states)
            .ok_or(Error::JointTooLarge {
                limit: self.max_states,
            })?;

        let vars: Vec<usize> = (0..network.len()).collect();
        let mut joint = Potential::unit(network, &vars);
        debug_assert_eq!(joint.len(), size);
        for i in 0..network.len() {
            joint.multiply_factor(&network.family(i), network.family_table(i));
        }
        for (&node, &state) in &prepared.hard {
            joint.restrict(node, state);
        }
        if joint.total() <= 0.0 {
            return Err(Error::ImpossibleEvidence);
        }
        if prepared.has_soft() {
            joint = ipfp::fit(&joint, &prepared.targets(), &self.settings).potential;
        }
        joint.normalize().ok_or(Error::ImpossibleEvidence)?;
        Ok(joint)
    }
}

impl Inference for EnumerationEngine {
    fn infer(&self, network: &Network, query: &Combination, evidence: &Evidence) -> Result<f64> {
        let joint = self.posterior(network, evidence)?;
        let mut pairs = Vec::with_capacity(query.len());
        for (id, state) in query {
            let node = network.require_index(id)?;
            pairs.push((node, network.require_state(node, state)?));
        }
        if pairs.is_empty() {
            return Ok(1.0);
        }
        Ok(joint.matching_mass(&pairs))
    }

    fn marginals(&self, network: &Network, evidence: &Evidence) -> Result<Marginals> {
        let joint = self.posterior(network, evidence)?;
        Ok((0..network.len())
            .map(|i| {
                let marginal = joint.marginalize(&[i]);
                let dist = network
                    .states(i)
                    .iter()
                    .cloned()
                    .zip(marginal.values().iter().copied())
                    .collect();
                (network.id(i).to_string(), dist)
            })
            .collect())
    }
}
