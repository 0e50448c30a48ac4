//! Junction-tree inference engine.
//!
//! # Pipeline
//!
//! 1. Validate and normalize the evidence
//! 2. Build (or fetch) the junction tree, forcing all soft-evidence nodes
//!    into one big clique
//! 3. Assemble clique potentials and apply hard evidence
//! 4. Collect toward the big clique
//! 5. Fit the big clique to the soft-evidence targets (IPFP)
//! 6. Distribute from the big clique
//! 7. Normalize every clique
//!
//! Steps 4 to 6 run per connected component; components without the big
//! clique are rooted at their lowest clique id.

use jt_common::{Combination, Error, Evidence, Network, Result};
use jt_config::InferenceConfig;
use jt_math::{entropy, round_to};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::assemble::initial_potentials;
use super::cache::{CacheStats, PotentialCache, PotentialKey, StructureCache, StructureKey};
use super::ipfp::{self, IpfpSettings, IpfpSummary};
use super::potential::Potential;
use super::propagate::{collect, distribute, rooted_components, MessageCache};
use super::query::{node_marginal, query_probability};
use crate::evidence::{clamp_network, prepare_evidence, PreparedEvidence};
use crate::structure::JunctionTree;

/// Node id → state → posterior probability.
pub type Marginals = BTreeMap<String, BTreeMap<String, f64>>;

/// Exact inference over a network.
pub trait Inference {
    /// `P(query | evidence)`.
    fn infer(&self, network: &Network, query: &Combination, evidence: &Evidence) -> Result<f64>;

    /// Posterior distribution of every node.
    fn marginals(&self, network: &Network, evidence: &Evidence) -> Result<Marginals>;
}

/// Propagated and normalized clique potentials for one evidence set.
#[derive(Debug, Clone)]
pub struct RawInference {
    tree: Arc<JunctionTree>,
    potentials: Vec<Potential>,
    ipfp: Option<IpfpSummary>,
}

/// One row of a clique table.
#[derive(Debug, Clone, Serialize)]
pub struct PotentialRow {
    pub when: Combination,
    pub then: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CliqueTable {
    pub id: usize,
    pub nodes: Vec<String>,
    pub potential: Vec<PotentialRow>,
}

/// Serializable view of a [`RawInference`].
#[derive(Debug, Clone, Serialize)]
pub struct RawReport {
    pub cliques: Vec<CliqueTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipfp: Option<IpfpSummary>,
}

impl RawInference {
    pub fn new(tree: Arc<JunctionTree>, potentials: Vec<Potential>, ipfp: Option<IpfpSummary>) -> Self {
        Self {
            tree,
            potentials,
            ipfp,
        }
    }

    pub fn tree(&self) -> &JunctionTree {
        &self.tree
    }

    pub fn potentials(&self) -> &[Potential] {
        &self.potentials
    }

    pub fn ipfp(&self) -> Option<&IpfpSummary> {
        self.ipfp.as_ref()
    }

    pub fn query(&self, network: &Network, combination: &Combination) -> Result<f64> {
        query_probability(network, &self.tree, &self.potentials, combination)
    }

    pub fn marginal(&self, node: usize) -> Result<Vec<f64>> {
        node_marginal(&self.tree, &self.potentials, node)
    }

    /// Posterior over the family of `node`, laid out like its family table.
    pub fn family_marginal(&self, network: &Network, node: usize) -> Result<Potential> {
        let family = network.family(node);
        let clique = self
            .tree
            .smallest_clique_containing(&family)
            .ok_or_else(|| Error::MissingFamilyClique {
                node: network.id(node).to_string(),
            })?;
        Ok(self.potentials[clique].marginalize(&family))
    }

    /// Entropy of the posterior joint, in nats.
    ///
    /// The calibrated tree factors the joint as cliques over sepsets, so the
    /// entropy is the clique entropies minus the sepset entropies.
    pub fn entropy(&self) -> f64 {
        let cliques: f64 = self.potentials.iter().map(|p| entropy(p.values())).sum();
        let sepsets: f64 = self
            .tree
            .sepsets()
            .iter()
            .map(|s| entropy(self.potentials[s.cliques.0].marginalize(&s.nodes).values()))
            .sum();
        cliques - sepsets
    }

    pub fn report(&self, network: &Network) -> RawReport {
        let cliques = self
            .tree
            .cliques()
            .iter()
            .zip(&self.potentials)
            .map(|(clique, potential)| CliqueTable {
                id: clique.id,
                nodes: clique.nodes.iter().map(|&n| network.id(n).to_string()).collect(),
                potential: potential
                    .rows(network)
                    .map(|(when, then)| PotentialRow { when, then })
                    .collect(),
            })
            .collect();
        RawReport {
            cliques,
            ipfp: self.ipfp,
        }
    }
}

/// Options for [`JunctionTreeEngine::infer_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferAllOptions {
    /// Rebuild the junction tree and bypass the potential cache.
    pub force: bool,
    /// Decimal digits to round to.
    pub precision: u32,
    /// Treat evidence as the posterior of each evidenced node.
    pub clamp_soft_evidence: bool,
}

impl Default for InferAllOptions {
    fn default() -> Self {
        Self {
            force: false,
            precision: 8,
            clamp_soft_evidence: false,
        }
    }
}

impl From<&InferenceConfig> for InferAllOptions {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            precision: config.precision,
            ..Default::default()
        }
    }
}

/// Junction-tree engine owning its structure and potential caches.
#[derive(Debug)]
pub struct JunctionTreeEngine {
    config: InferenceConfig,
    structures: StructureCache,
    potentials: PotentialCache,
}

impl Default for JunctionTreeEngine {
    fn default() -> Self {
        Self::new(InferenceConfig::default())
    }
}

impl JunctionTreeEngine {
    pub fn new(config: InferenceConfig) -> Self {
        let potentials = PotentialCache::new(config.potential_cache_capacity);
        Self {
            config,
            structures: StructureCache::new(),
            potentials,
        }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn ipfp_settings(&self) -> IpfpSettings {
        IpfpSettings::from(&self.config)
    }

    /// Junction tree of `network` with `forced` node ids in one clique.
    pub fn structure(&self, network: &Network, forced: &[String], force: bool) -> Result<Arc<JunctionTree>> {
        let key = StructureKey::new(network.structure_signature(), forced);
        self.structures
            .get_or_build(key, force, || JunctionTree::build(network, forced))
    }

    /// Propagated potentials for `evidence`, served from the potential cache
    /// when possible.
    pub fn raw_infer(&self, network: &Network, evidence: &Evidence) -> Result<Arc<RawInference>> {
        let key = PotentialKey {
            network: network.signature().to_string(),
            evidence: evidence.content_hash()?,
        };
        self.potentials
            .get_or_compute(key, || self.compute_raw(network, evidence))
    }

    /// Propagated potentials for `evidence`; only the structure is cached.
    pub fn compute_raw(&self, network: &Network, evidence: &Evidence) -> Result<RawInference> {
        let prepared = prepare_evidence(network, evidence)?;
        self.compute_prepared(network, &prepared, false)
    }

    pub(crate) fn compute_prepared(
        &self,
        network: &Network,
        prepared: &PreparedEvidence,
        force: bool,
    ) -> Result<RawInference> {
        let forced = prepared.soft_ids(network);
        let tree = self.structure(network, &forced, force)?;
        let mut potentials = initial_potentials(network, &tree, &prepared.hard)?;

        let components = rooted_components(&tree, tree.big_clique());
        let mut messages = MessageCache::new();
        for component in &components {
            collect(&tree, component, &mut potentials, &mut messages)?;
        }

        let mut summary = None;
        if let Some(big) = tree.big_clique() {
            if potentials[big].total() <= 0.0 {
                return Err(Error::ImpossibleEvidence);
            }
            let outcome = ipfp::fit(&potentials[big], &prepared.targets(), &self.ipfp_settings());
            summary = Some(IpfpSummary::from(&outcome));
            potentials[big] = outcome.potential;
        }

        for component in &components {
            distribute(&tree, component, &mut potentials, &mut messages)?;
        }
        for potential in &mut potentials {
            potential.normalize().ok_or(Error::ImpossibleEvidence)?;
        }

        debug!(
            cliques = potentials.len(),
            hard = prepared.hard.len(),
            soft = prepared.soft.len(),
            "propagated evidence"
        );
        Ok(RawInference::new(tree, potentials, summary))
    }

    /// Posterior of every node, rounded to `options.precision` digits.
    pub fn infer_all(&self, network: &Network, evidence: &Evidence, options: InferAllOptions) -> Result<Marginals> {
        let prepared = prepare_evidence(network, evidence)?;
        let raw = match (options.clamp_soft_evidence, options.force) {
            (true, _) => {
                let clamped = clamp_network(network, evidence)?;
                Arc::new(self.compute_prepared(&clamped, &PreparedEvidence::default(), options.force)?)
            }
            (false, true) => Arc::new(self.compute_prepared(network, &prepared, true)?),
            (false, false) => self.raw_infer(network, evidence)?,
        };

        let mut marginals = collect_marginals(network, &raw, &prepared)?;
        for dist in marginals.values_mut() {
            for p in dist.values_mut() {
                *p = round_to(*p, options.precision);
            }
        }
        Ok(marginals)
    }

    pub fn clear_caches(&self) {
        self.potentials.clear();
        self.structures.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        let (structure_hits, structure_misses) = self.structures.counts();
        let (potential_hits, potential_misses) = self.potentials.counts();
        CacheStats {
            structure_hits,
            structure_misses,
            structure_entries: self.structures.len(),
            potential_hits,
            potential_misses,
            potential_entries: self.potentials.len(),
        }
    }
}

fn collect_marginals(network: &Network, raw: &RawInference, prepared: &PreparedEvidence) -> Result<Marginals> {
    let mut out = Marginals::new();
    for i in 0..network.len() {
        let dist = match prepared.hard.get(&i) {
            Some(&state) => (0..network.cardinality(i))
                .map(|s| if s == state { 1.0 } else { 0.0 })
                .collect(),
            None => raw.marginal(i)?,
        };
        out.insert(
            network.id(i).to_string(),
            network.states(i).iter().cloned().zip(dist).collect(),
        );
    }
    Ok(out)
}

impl Inference for JunctionTreeEngine {
    fn infer(&self, network: &Network, query: &Combination, evidence: &Evidence) -> Result<f64> {
        self.raw_infer(network, evidence)?.query(network, query)
    }

    fn marginals(&self, network: &Network, evidence: &Evidence) -> Result<Marginals> {
        let prepared = prepare_evidence(network, evidence)?;
        let raw = self.raw_infer(network, evidence)?;
        collect_marginals(network, &raw, &prepared)
    }
}

/// `P(query | evidence)` with a fresh default engine.
pub fn infer(network: &Network, query: &Combination, evidence: &Evidence) -> Result<f64> {
    JunctionTreeEngine::default().infer(network, query, evidence)
}

/// Propagated potentials with a fresh default engine.
pub fn raw_infer(network: &Network, evidence: &Evidence) -> Result<RawInference> {
    JunctionTreeEngine::default().compute_raw(network, evidence)
}

/// Posterior of every node with a fresh default engine.
pub fn infer_all(network: &Network, evidence: &Evidence, options: InferAllOptions) -> Result<Marginals> {
    JunctionTreeEngine::default().infer_all(network, evidence, options)
}
