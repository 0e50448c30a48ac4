//! Error types for junction-tree inference and learning.
//!
//! Every error carries:
//! - A stable numeric code for machine parsing
//! - A category for grouping
//! - A remediation hint for humans
//!
//! Structural and evidence errors are caller mistakes and are never recovered
//! internally. Invariant violations indicate a bug in structure construction
//! and are raised instead of silently defaulting, since a silent default would
//! corrupt learned parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for junction-tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed network: unknown references, bad CPTs, cycles.
    Structure,
    /// Invalid or impossible evidence and queries.
    Evidence,
    /// Internal junction-tree invariant violated.
    Invariant,
    /// Parameter learning failures.
    Learning,
    /// File I/O and serialization errors.
    Io,
    /// Engine configuration errors.
    Config,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Structure => write!(f, "structure"),
            ErrorCategory::Evidence => write!(f, "evidence"),
            ErrorCategory::Invariant => write!(f, "invariant"),
            ErrorCategory::Learning => write!(f, "learning"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Config => write!(f, "config"),
        }
    }
}

/// Unified error type for junction-tree operations.
#[derive(Error, Debug)]
pub enum Error {
    // Structural validation (10-19)
    #[error("network has no nodes")]
    EmptyNetwork,

    #[error("duplicate node id '{node}'")]
    DuplicateNode { node: String },

    #[error("node '{node}' declares {count} state(s); at least 2 are required")]
    TooFewStates { node: String, count: usize },

    #[error("node '{node}' declares state '{state}' more than once")]
    DuplicateState { node: String, state: String },

    #[error("node '{node}' references unknown parent '{parent}'")]
    UnknownParent { node: String, parent: String },

    #[error("network contains a cycle through node '{node}'")]
    CyclicGraph { node: String },

    #[error("malformed CPT for node '{node}': {message}")]
    MalformedCpt { node: String, message: String },

    #[error("distribution of node '{node}' for context {context} sums to {sum}, expected 1")]
    InvalidDistribution {
        node: String,
        context: String,
        sum: f64,
    },

    // Evidence validation (20-29)
    #[error("unknown node '{node}'")]
    UnknownNode { node: String },

    #[error("node '{node}' has no state '{state}'")]
    UnknownState { node: String, state: String },

    #[error("soft evidence for node '{node}' has invalid weight {weight} for state '{state}'")]
    InvalidSoftWeight {
        node: String,
        state: String,
        weight: f64,
    },

    #[error("soft evidence for node '{node}' has no positive weight")]
    ZeroEvidenceMass { node: String },

    #[error("evidence has zero probability under the network")]
    ImpossibleEvidence,

    // Invariant violations (30-39)
    #[error("forced clique references node '{node}' absent from the graph")]
    ForcedCliqueNodeMissing { node: String },

    #[error("no clique contains the family of node '{node}'")]
    MissingFamilyClique { node: String },

    #[error("no sepset between adjacent cliques {a} and {b}")]
    MissingSepSet { a: usize, b: usize },

    #[error("no clique contains all soft-evidence nodes {nodes:?}")]
    MissingBigClique { nodes: Vec<String> },

    #[error("no single clique spans query nodes {nodes:?}")]
    QueryNotCovered { nodes: Vec<String> },

    #[error("joint distribution exceeds the enumeration limit of {limit} states")]
    JointTooLarge { limit: usize },

    // Learning (50-59)
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("node '{node}' received zero expected count for parent context {context}")]
    EmptyContext { node: String, context: String },

    // I/O and serialization (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(String),

    // Configuration (70-79)
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Structural validation
    /// - 20-29: Evidence validation
    /// - 30-39: Invariant violations
    /// - 50-59: Learning
    /// - 60-69: I/O and serialization
    /// - 70-79: Configuration
    pub fn code(&self) -> u32 {
        match self {
            Error::EmptyNetwork => 10,
            Error::DuplicateNode { .. } => 11,
            Error::TooFewStates { .. } => 12,
            Error::DuplicateState { .. } => 13,
            Error::UnknownParent { .. } => 14,
            Error::CyclicGraph { .. } => 15,
            Error::MalformedCpt { .. } => 16,
            Error::InvalidDistribution { .. } => 17,
            Error::UnknownNode { .. } => 20,
            Error::UnknownState { .. } => 21,
            Error::InvalidSoftWeight { .. } => 22,
            Error::ZeroEvidenceMass { .. } => 23,
            Error::ImpossibleEvidence => 24,
            Error::ForcedCliqueNodeMissing { .. } => 30,
            Error::MissingFamilyClique { .. } => 31,
            Error::MissingSepSet { .. } => 32,
            Error::MissingBigClique { .. } => 33,
            Error::QueryNotCovered { .. } => 34,
            Error::JointTooLarge { .. } => 35,
            Error::EmptyTrainingSet => 50,
            Error::EmptyContext { .. } => 51,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Parse(_) => 62,
            Error::Config(_) => 70,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EmptyNetwork
            | Error::DuplicateNode { .. }
            | Error::TooFewStates { .. }
            | Error::DuplicateState { .. }
            | Error::UnknownParent { .. }
            | Error::CyclicGraph { .. }
            | Error::MalformedCpt { .. }
            | Error::InvalidDistribution { .. } => ErrorCategory::Structure,

            Error::UnknownNode { .. }
            | Error::UnknownState { .. }
            | Error::InvalidSoftWeight { .. }
            | Error::ZeroEvidenceMass { .. }
            | Error::ImpossibleEvidence => ErrorCategory::Evidence,

            Error::ForcedCliqueNodeMissing { .. }
            | Error::MissingFamilyClique { .. }
            | Error::MissingSepSet { .. }
            | Error::MissingBigClique { .. }
            | Error::QueryNotCovered { .. }
            | Error::JointTooLarge { .. } => ErrorCategory::Invariant,

            Error::EmptyTrainingSet | Error::EmptyContext { .. } => ErrorCategory::Learning,

            Error::Io(_) | Error::Json(_) | Error::Parse(_) => ErrorCategory::Io,

            Error::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether the error points at a defect in this library rather than at
    /// the caller's input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Error::MissingFamilyClique { .. }
                | Error::MissingSepSet { .. }
                | Error::MissingBigClique { .. }
        )
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Structure => "fix the network file; run 'jt check' to validate it",
            ErrorCategory::Evidence => match self {
                Error::ImpossibleEvidence => {
                    "the observed states cannot occur together under the network's CPTs"
                }
                _ => "check evidence node ids, state names, and weights",
            },
            ErrorCategory::Invariant => match self {
                Error::QueryNotCovered { .. } => {
                    "query fewer nodes at once, or use the enumeration engine"
                }
                Error::JointTooLarge { .. } => {
                    "use the junction-tree engine, or raise the enumeration limit"
                }
                Error::ForcedCliqueNodeMissing { .. } => {
                    "soft evidence must reference nodes of the network"
                }
                _ => "internal junction-tree error; please report it with the network",
            },
            ErrorCategory::Learning => match self {
                Error::EmptyTrainingSet => "provide at least one observation",
                _ => "set a positive pseudo-count or add observations covering every context",
            },
            ErrorCategory::Io => "check file paths and formats",
            ErrorCategory::Config => "run 'jt config' to inspect the resolved configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::EmptyNetwork.code(), 10);
        assert_eq!(
            Error::UnknownState {
                node: "A".into(),
                state: "x".into()
            }
            .code(),
            21
        );
        assert_eq!(Error::MissingSepSet { a: 0, b: 1 }.code(), 32);
        assert_eq!(Error::Config("bad".into()).code(), 70);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::CyclicGraph { node: "A".into() }.category(),
            ErrorCategory::Structure
        );
        assert_eq!(Error::ImpossibleEvidence.category(), ErrorCategory::Evidence);
        assert_eq!(
            Error::QueryNotCovered { nodes: vec![] }.category(),
            ErrorCategory::Invariant
        );
        assert_eq!(Error::EmptyTrainingSet.category(), ErrorCategory::Learning);
    }

    #[test]
    fn test_is_internal() {
        assert!(Error::MissingFamilyClique { node: "A".into() }.is_internal());
        assert!(!Error::UnknownNode { node: "A".into() }.is_internal());
        assert!(!Error::QueryNotCovered { nodes: vec![] }.is_internal());
        assert!(!Error::JointTooLarge { limit: 4 }.is_internal());
        assert!(!Error::EmptyContext { node: "A".into(), context: "{}".into() }.is_internal());
    }

    #[test]
    fn test_display_mentions_context() {
        let err = Error::InvalidSoftWeight {
            node: "RAIN".into(),
            state: "T".into(),
            weight: -1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("RAIN"));
        assert!(msg.contains("-1"));
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::Invariant).unwrap();
        assert_eq!(json, "\"invariant\"");
    }
}
