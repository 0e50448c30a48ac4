pub mod dirichlet;
pub mod distribution;
pub mod stable;
