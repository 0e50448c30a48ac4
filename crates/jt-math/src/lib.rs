//! Junction-tree math utilities.

pub mod math;

pub use math::dirichlet;
pub use math::distribution::*;
pub use math::stable::*;
