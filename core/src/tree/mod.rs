// reqchain/src/tree/mod.rs

//! The conditional dispatch tree.
//!
//! Each `ChainNode` pairs a `Chain` with the `Condition` guarding it. Calling
//! `next()` on a node picks exactly one child (the lowest-index match), its
//! fallback, or nothing; the caller then runs the selected node's chain.

pub mod node;
pub mod traversal;

pub use node::ChainNode;
