//! Two-pass message passing over the junction forest.
//!
//! # Algorithm
//!
//! 1. Root every tree of the forest (the requested root where it lies in the
//!    tree, otherwise the tree's lowest clique id)
//! 2. Collect: pass messages from leaves toward the root
//! 3. Distribute: pass messages from the root back to the leaves
//!
//! A message from `a` to `b` is the marginal of `a` onto their sepset. When a
//! message already travelled the same edge in the other direction, the new
//! marginal is divided by it before `b` absorbs it, so nothing is counted
//! twice. Every sent marginal is cached by the unordered clique pair.

use jt_common::Result;
use std::collections::{HashMap, VecDeque};
use tracing::trace;

use super::potential::Potential;
use crate::structure::JunctionTree;

/// Last marginal sent across each tree edge, keyed by `(low, high)` clique id.
#[derive(Debug, Clone, Default)]
pub struct MessageCache {
    messages: HashMap<(usize, usize), Potential>,
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: usize, b: usize) -> Option<&Potential> {
        self.messages.get(&edge_key(a, b))
    }

    pub fn insert(&mut self, a: usize, b: usize, message: Potential) {
        self.messages.insert(edge_key(a, b), message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// One tree of the forest with a chosen root.
#[derive(Debug, Clone)]
pub struct RootedComponent {
    root: usize,
    /// `(clique, parent)` in breadth-first order from the root.
    bfs: Vec<(usize, usize)>,
}

impl RootedComponent {
    pub fn new(tree: &JunctionTree, root: usize) -> Self {
        let mut visited = vec![false; tree.cliques().len()];
        visited[root] = true;
        let mut bfs = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(x) = queue.pop_front() {
            for &(y, _) in tree.neighbors(x) {
                if !visited[y] {
                    visited[y] = true;
                    bfs.push((y, x));
                    queue.push_back(y);
                }
            }
        }
        RootedComponent { root, bfs }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    /// `(child, parent)` edges, deepest first.
    pub fn upward_order(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bfs.iter().rev().copied()
    }

    /// `(child, parent)` edges, root side first.
    pub fn downward_order(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bfs.iter().copied()
    }
}

/// Rooted trees of the forest. `root` roots its own tree; the others use
/// their lowest clique id.
pub fn rooted_components(tree: &JunctionTree, root: Option<usize>) -> Vec<RootedComponent> {
    tree.components()
        .iter()
        .enumerate()
        .filter_map(|(c, members)| {
            let chosen = match root {
                Some(r) if tree.component_of(r) == c => r,
                _ => *members.first()?,
            };
            Some(RootedComponent::new(tree, chosen))
        })
        .collect()
}

/// Send the sepset marginal of `from` into `to`.
pub fn pass_message(
    tree: &JunctionTree,
    potentials: &mut [Potential],
    cache: &mut MessageCache,
    from: usize,
    to: usize,
) -> Result<()> {
    let sepset = tree.sepset_between(from, to)?;
    let marginal = potentials[from].marginalize(&sepset.nodes);
    let update = match cache.get(from, to) {
        Some(previous) => marginal.divide(previous),
        None => marginal.clone(),
    };
    trace!(from, to, sepset = ?sepset.nodes, "passing message");
    potentials[to].absorb(&update);
    cache.insert(from, to, marginal);
    Ok(())
}

pub fn collect(
    tree: &JunctionTree,
    component: &RootedComponent,
    potentials: &mut [Potential],
    cache: &mut MessageCache,
) -> Result<()> {
    for (child, parent) in component.upward_order() {
        pass_message(tree, potentials, cache, child, parent)?;
    }
    Ok(())
}

pub fn distribute(
    tree: &JunctionTree,
    component: &RootedComponent,
    potentials: &mut [Potential],
    cache: &mut MessageCache,
) -> Result<()> {
    for (child, parent) in component.downward_order() {
        pass_message(tree, potentials, cache, parent, child)?;
    }
    Ok(())
}

/// Collect then distribute over every tree of the forest.
pub fn propagate(
    tree: &JunctionTree,
    potentials: &mut [Potential],
    root: Option<usize>,
) -> Result<MessageCache> {
    let mut cache = MessageCache::new();
    for component in rooted_components(tree, root) {
        collect(tree, &component, potentials, &mut cache)?;
        distribute(tree, &component, potentials, &mut cache)?;
    }
    Ok(cache)
}
