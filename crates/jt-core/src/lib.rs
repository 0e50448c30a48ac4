//! Junction-tree inference and EM learning for discrete Bayesian networks.
//!
//! This library provides:
//! - Structure: moralization, min-fill triangulation, junction forests
//! - Inference: collect/distribute propagation with soft evidence fitted by
//!   IPFP on a big clique, plus a brute-force enumeration oracle
//! - Learning: Expectation-Maximization over hard and soft observations
//! - CLI support: logging, exit codes, file I/O
//!
//! The binary entry point is in `main.rs`.

pub mod evidence;
pub mod exit_codes;
pub mod inference;
pub mod io;
pub mod learning;
pub mod logging;
pub mod structure;

pub use evidence::{clamp_network, prepare_evidence, PreparedEvidence};
pub use inference::{
    infer, infer_all, raw_infer, EnumerationEngine, InferAllOptions, Inference, JunctionTreeEngine,
    Marginals, RawInference,
};
pub use learning::{learn, learning_from_evidence, LearningOutcome, StopReason};
pub use structure::JunctionTree;
