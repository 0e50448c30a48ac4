//! Expectation-Maximization for CPT parameters.
//!
//! # Algorithm
//!
//! - **E-step**: run inference with each observation as evidence and add the
//!   posterior of every node's family to that node's expected counts. Soft
//!   evidence always enters as an inference condition (IPFP on the big
//!   clique), never as raw fractional counts. An observation that fixes
//!   every node with hard evidence contributes indicator counts directly,
//!   which equals its family posterior without propagating.
//! - **M-step**: normalize the counts within every parent context, optionally
//!   smoothed with a symmetric Dirichlet pseudo-count.
//! - **Objective**: `Σ count · ln θ` over all family cells with the new
//!   parameters, plus the entropy of every observation's posterior (and the
//!   pseudo-count term when smoothing). This is `-Σ KL(q ‖ P_θ)` over the
//!   fitted posteriors `q`, which neither step can increase, so it is
//!   non-decreasing with soft evidence on any number of nodes. With hard
//!   evidence alone it equals `Σ ln P(e | θ)`.
//!
//! Iteration stops when the objective drops (the previous parameters are
//! kept), when its relative change falls below the stop ratio, or at the
//! iteration cap.

use jt_common::{Error, Evidence, Network, Result};
use jt_config::LearningConfig;
use jt_math::{dirichlet, relative_change, xlogy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::thread;
use tracing::{debug, info, warn};

use crate::evidence::prepare_evidence;
use crate::inference::JunctionTreeEngine;

/// Expected counts per node, laid out like [`Network::family_table`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCounts {
    tables: Vec<Vec<f64>>,
    /// Summed entropy of the per-observation posteriors.
    entropy: f64,
}

impl ExpectedCounts {
    pub fn zeros(network: &Network) -> Self {
        Self {
            tables: (0..network.len())
                .map(|i| vec![0.0; network.family_table(i).len()])
                .collect(),
            entropy: 0.0,
        }
    }

    pub fn tables(&self) -> &[Vec<f64>] {
        &self.tables
    }

    pub fn table(&self, node: usize) -> &[f64] {
        &self.tables[node]
    }

    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    /// Elementwise sum.
    pub fn merge(&mut self, other: &ExpectedCounts) {
        self.entropy += other.entropy;
        for (mine, theirs) in self.tables.iter_mut().zip(&other.tables) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                *a += b;
            }
        }
    }

    fn add_table(&mut self, node: usize, values: &[f64]) {
        for (a, b) in self.tables[node].iter_mut().zip(values) {
            *a += b;
        }
    }

    fn add_indicators(&mut self, network: &Network, hard: &BTreeMap<usize, usize>) {
        for node in 0..network.len() {
            let family = network.family(node);
            let cards: Vec<usize> = family.iter().map(|&v| network.cardinality(v)).collect();
            let states: Vec<usize> = family.iter().map(|v| hard[v]).collect();
            let cell = jt_common::network::context_index(&cards, &states);
            self.tables[node][cell] += 1.0;
        }
    }
}

/// Why the EM loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Relative log-likelihood change fell below the stop ratio.
    Converged,
    /// The log-likelihood dropped; the previous parameters were kept.
    LikelihoodDecreased,
    IterationCap,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Converged => write!(f, "converged"),
            StopReason::LikelihoodDecreased => write!(f, "likelihood_decreased"),
            StopReason::IterationCap => write!(f, "iteration_cap"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LearningOutcome {
    pub network: Network,
    /// Iterations run, including a rejected final one.
    pub iterations: usize,
    /// [`em_objective`] after every M-step.
    pub log_likelihoods: Vec<f64>,
    pub stop_reason: StopReason,
}

fn accumulate(
    engine: &JunctionTreeEngine,
    network: &Network,
    observations: &[Evidence],
) -> Result<ExpectedCounts> {
    let mut counts = ExpectedCounts::zeros(network);
    for observation in observations {
        let prepared = prepare_evidence(network, observation)?;
        if prepared.is_complete_hard(network) {
            counts.add_indicators(network, &prepared.hard);
            continue;
        }
        let raw = engine.compute_prepared(network, &prepared, false)?;
        for node in 0..network.len() {
            counts.add_table(node, raw.family_marginal(network, node)?.values());
        }
        counts.entropy += raw.entropy();
    }
    Ok(counts)
}

/// Expected family counts over all observations.
///
/// With `workers > 1` the observations are split into contiguous chunks, one
/// scoped thread each, and the partial counts are summed.
pub fn expectation_step(
    engine: &JunctionTreeEngine,
    network: &Network,
    observations: &[Evidence],
    workers: usize,
) -> Result<ExpectedCounts> {
    if workers <= 1 || observations.len() < 2 {
        return accumulate(engine, network, observations);
    }

    let chunk_size = observations.len().div_ceil(workers);
    thread::scope(|s| {
        let handles: Vec<_> = observations
            .chunks(chunk_size)
            .map(|chunk| s.spawn(move || accumulate(engine, network, chunk)))
            .collect();

        let mut total = ExpectedCounts::zeros(network);
        for handle in handles {
            let part = handle
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload))?;
            total.merge(&part);
        }
        Ok(total)
    })
}

/// New network whose CPT rows are the normalized expected counts.
pub fn maximization_step(network: &Network, counts: &ExpectedCounts, pseudo_count: f64) -> Result<Network> {
    let mut tables = Vec::with_capacity(network.len());
    for node in 0..network.len() {
        let card = network.cardinality(node);
        let mut table = Vec::with_capacity(counts.table(node).len());
        for (context, row) in counts.table(node).chunks(card).enumerate() {
            let estimate = dirichlet::posterior_mean(row, pseudo_count).ok_or_else(|| Error::EmptyContext {
                node: network.id(node).to_string(),
                context: network.context_label(node, context),
            })?;
            table.extend(estimate);
        }
        tables.push(table);
    }
    network.with_family_tables(&tables)
}

/// `Σ count · ln θ` over every family cell of `network`.
pub fn complete_data_log_likelihood(network: &Network, counts: &ExpectedCounts) -> f64 {
    (0..network.len())
        .map(|node| {
            counts
                .table(node)
                .iter()
                .zip(network.family_table(node))
                .map(|(&count, &p)| xlogy(count, p))
                .sum::<f64>()
        })
        .sum()
}

/// Quantity EM never decreases: expected log-likelihood of `counts` under
/// `network`, plus the posterior entropy and the Dirichlet prior term.
pub fn em_objective(network: &Network, counts: &ExpectedCounts, pseudo_count: f64) -> f64 {
    let prior: f64 = (0..network.len())
        .flat_map(|node| network.family_table(node).iter())
        .map(|&p| xlogy(pseudo_count, p))
        .sum();
    complete_data_log_likelihood(network, counts) + prior + counts.entropy
}

/// Run EM from `network` over `observations`.
pub fn learn(
    engine: &JunctionTreeEngine,
    network: &Network,
    observations: &[Evidence],
    config: &LearningConfig,
) -> Result<LearningOutcome> {
    if observations.is_empty() {
        return Err(Error::EmptyTrainingSet);
    }

    let mut current = network.clone();
    let mut log_likelihoods = Vec::new();
    let mut previous = f64::NEG_INFINITY;
    let mut stop_reason = StopReason::IterationCap;
    let mut iterations = 0;

    for iteration in 1..=config.max_iterations {
        iterations = iteration;
        let counts = expectation_step(engine, &current, observations, config.workers)?;
        let next = maximization_step(&current, &counts, config.pseudo_count)?;
        let log_likelihood = em_objective(&next, &counts, config.pseudo_count);
        log_likelihoods.push(log_likelihood);
        debug!(iteration, log_likelihood, "EM iteration");

        if log_likelihood - previous < -config.likelihood_tolerance {
            warn!(
                iteration,
                previous,
                log_likelihood,
                "log-likelihood decreased; keeping previous parameters"
            );
            stop_reason = StopReason::LikelihoodDecreased;
            break;
        }
        current = next;
        if relative_change(log_likelihood, previous) < config.stop_ratio {
            stop_reason = StopReason::Converged;
            break;
        }
        previous = log_likelihood;
    }

    if stop_reason == StopReason::IterationCap {
        warn!(
            max_iterations = config.max_iterations,
            "EM reached the iteration cap before converging"
        );
    }
    info!(
        iterations,
        observations = observations.len(),
        stop_reason = %stop_reason,
        log_likelihood = log_likelihoods.last().copied().unwrap_or(f64::NEG_INFINITY),
        "learning finished"
    );
    Ok(LearningOutcome {
        network: current,
        iterations,
        log_likelihoods,
        stop_reason,
    })
}

/// Re-estimate the CPTs of `network` from `observations`.
///
/// The input network is not modified.
pub fn learning_from_evidence(network: &Network, observations: &[Evidence], stop_ratio: f64) -> Result<Network> {
    let engine = JunctionTreeEngine::default();
    let config = LearningConfig::with_stop_ratio(stop_ratio);
    Ok(learn(&engine, network, observations, &config)?.network)
}
