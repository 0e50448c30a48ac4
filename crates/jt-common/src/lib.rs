//! Junction-tree common types and errors.
//!
//! This crate provides the data model shared by the inference and learning
//! crates:
//! - Networks of discrete nodes with validated CPTs
//! - Hard and soft evidence, and state combinations
//! - Content signatures used as cache keys
//! - The unified error taxonomy

pub mod error;
pub mod evidence;
pub mod network;
pub mod signature;

pub use error::{Error, ErrorCategory, Result};
pub use evidence::{Combination, Evidence, EvidenceValue};
pub use network::{Cpt, CptRow, Network, Node};
pub use signature::content_hash;

/// Schema version for serialized networks and evidence.
pub const SCHEMA_VERSION: &str = "1.0.0";
