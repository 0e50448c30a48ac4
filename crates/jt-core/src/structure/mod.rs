//! Static junction-tree structure.
//!
//! The pipeline runs once per (network, forced-clique node set):
//!
//! 1. [`graph`]: undirected view of the DAG
//! 2. [`moral`]: marry co-parents and connect the forced clique
//! 3. [`triangulate`]: greedy min-fill elimination to a chordal graph
//! 4. [`junction_tree`]: maximal cliques, sepsets, maximum-weight spanning forest
//!
//! None of it depends on evidence values, so results are cached per network
//! signature and forced set.

pub mod graph;
pub mod junction_tree;
pub mod moral;
pub mod triangulate;

pub use graph::UndirectedGraph;
pub use junction_tree::{Clique, JunctionTree, SepSet, StructureReport};
pub use moral::moralize;
pub use triangulate::{maximal_cliques, triangulate, Triangulation};
