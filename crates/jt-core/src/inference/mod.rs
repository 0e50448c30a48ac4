//! Exact inference: potentials, propagation, soft evidence, and engines.

pub mod assemble;
pub mod cache;
pub mod engine;
pub mod enumeration;
pub mod ipfp;
pub mod potential;
pub mod propagate;
pub mod query;

pub use cache::{CacheStats, PotentialCache, StructureCache};
pub use engine::{
    infer, infer_all, raw_infer, InferAllOptions, Inference, JunctionTreeEngine, Marginals,
    RawInference, RawReport,
};
pub use enumeration::EnumerationEngine;
pub use ipfp::{IpfpOutcome, IpfpSettings, IpfpSummary};
pub use potential::Potential;
