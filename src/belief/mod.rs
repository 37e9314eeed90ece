//! Reduction of the two-state tiger POMDP to a fully observed MDP over a belief grid.

pub mod grid;
pub mod observation;
pub mod policy;
pub mod tiger;
