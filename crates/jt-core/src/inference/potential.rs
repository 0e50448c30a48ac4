//! Dense potential tables over sets of discrete variables.
//!
//! A [`Potential`] stores one non-negative value per joint state of its
//! variables. Rows are laid out in mixed radix with the last variable varying
//! fastest, the same layout the network uses for family tables, so a CPT can
//! be multiplied in without reshaping.

use jt_common::network::decode_context;
use jt_common::{Combination, Network};
use jt_math::{normalize, safe_div};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Potential {
    vars: Vec<usize>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

impl Potential {
    /// Potential of all ones over `vars`.
    pub fn ones(vars: Vec<usize>, cards: Vec<usize>) -> Self {
        debug_assert_eq!(vars.len(), cards.len());
        let size = cards.iter().product();
        Potential {
            vars,
            cards,
            values: vec![1.0; size],
        }
    }

    /// Potential of all ones over network nodes `vars`.
    pub fn unit(network: &Network, vars: &[usize]) -> Self {
        let cards = vars.iter().map(|&v| network.cardinality(v)).collect();
        Self::ones(vars.to_vec(), cards)
    }

    pub fn vars(&self) -> &[usize] {
        &self.vars
    }

    pub fn cards(&self) -> &[usize] {
        &self.cards
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn position(&self, var: usize) -> Option<usize> {
        self.vars.iter().position(|&v| v == var)
    }

    /// For every row, the index of the matching row in a table over
    /// `sub_vars` (a subset of this potential's variables, in any order).
    ///
    /// Walks the rows as an odometer, so the map costs one pass.
    pub fn index_map(&self, sub_vars: &[usize]) -> Vec<usize> {
        let mut stride = vec![0usize; self.vars.len()];
        let mut step = 1;
        for &v in sub_vars.iter().rev() {
            if let Some(p) = self.position(v) {
                stride[p] = step;
                step *= self.cards[p];
            }
        }

        let mut map = Vec::with_capacity(self.values.len());
        let mut states = vec![0usize; self.vars.len()];
        let mut current = 0usize;
        for _ in 0..self.values.len() {
            map.push(current);
            for p in (0..self.vars.len()).rev() {
                states[p] += 1;
                current += stride[p];
                if states[p] < self.cards[p] {
                    break;
                }
                current -= stride[p] * self.cards[p];
                states[p] = 0;
            }
        }
        map
    }

    /// Sum out every variable not in `onto`; the result keeps `onto`'s order.
    pub fn marginalize(&self, onto: &[usize]) -> Potential {
        let cards: Vec<usize> = onto
            .iter()
            .map(|&v| self.position(v).map_or(1, |p| self.cards[p]))
            .collect();
        let mut out = Potential {
            vars: onto.to_vec(),
            values: vec![0.0; cards.iter().product()],
            cards,
        };
        for (value, target) in self.values.iter().zip(self.index_map(onto)) {
            out.values[target] += value;
        }
        out
    }

    /// Elementwise `self / old` over identical variables, with `x / 0 = 0`.
    pub fn divide(&self, old: &Potential) -> Potential {
        debug_assert_eq!(self.vars, old.vars);
        Potential {
            vars: self.vars.clone(),
            cards: self.cards.clone(),
            values: self
                .values
                .iter()
                .zip(&old.values)
                .map(|(&n, &d)| safe_div(n, d))
                .collect(),
        }
    }

    /// Multiply in a message over a subset of this potential's variables.
    pub fn absorb(&mut self, message: &Potential) {
        let map = self.index_map(&message.vars);
        for (value, m) in self.values.iter_mut().zip(map) {
            *value *= message.values[m];
        }
    }

    /// Multiply in a dense table over `family` laid out last-fastest.
    pub fn multiply_factor(&mut self, family: &[usize], table: &[f64]) {
        let map = self.index_map(family);
        for (value, m) in self.values.iter_mut().zip(map) {
            *value *= table[m];
        }
    }

    /// Scale each row by `factors[state of var]`.
    pub fn scale_variable(&mut self, var: usize, factors: &[f64]) {
        let map = self.index_map(&[var]);
        for (value, s) in self.values.iter_mut().zip(map) {
            *value *= factors[s];
        }
    }

    /// Zero every row where `var` is not in `state`.
    pub fn restrict(&mut self, var: usize, state: usize) {
        if self.position(var).is_none() {
            return;
        }
        let map = self.index_map(&[var]);
        for (value, s) in self.values.iter_mut().zip(map) {
            if s != state {
                *value = 0.0;
            }
        }
    }

    /// Total mass of rows agreeing with every `(var, state)` pair.
    pub fn matching_mass(&self, pairs: &[(usize, usize)]) -> f64 {
        let vars: Vec<usize> = pairs.iter().map(|&(v, _)| v).collect();
        let marginal = self.marginalize(&vars);
        let states: Vec<usize> = pairs.iter().map(|&(_, s)| s).collect();
        marginal.values[jt_common::network::context_index(&marginal.cards, &states)]
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Scale to total 1; returns the previous total, or `None` for zero mass.
    pub fn normalize(&mut self) -> Option<f64> {
        normalize(&mut self.values)
    }

    /// Per-variable states of row `row`.
    pub fn row_states(&self, row: usize) -> Vec<usize> {
        decode_context(&self.cards, row)
    }

    /// Rows as named state combinations with their values.
    pub fn rows<'a>(
        &'a self,
        network: &'a Network,
    ) -> impl Iterator<Item = (Combination, f64)> + 'a {
        self.values.iter().enumerate().map(move |(row, &value)| {
            let combination = self
                .vars
                .iter()
                .zip(self.row_states(row))
                .map(|(&v, s)| (network.id(v).to_string(), network.states(v)[s].clone()))
                .collect();
            (combination, value)
        })
    }
}
