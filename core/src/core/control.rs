// reqchain/src/core/control.rs

//! Traversal policy and the outcome types returned by `ChainNode::next`.

use crate::tree::ChainNode;
use std::sync::Arc;

/// Per-node evaluation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalOptions {
  /// Evaluate all children concurrently and decide after the join.
  pub parallel_evaluation: bool,
  /// Treat a failing condition as "did not match" instead of aborting.
  pub continue_on_failure: bool,
}

impl TraversalOptions {
  pub fn with_parallel_evaluation(mut self, parallel: bool) -> Self {
    self.parallel_evaluation = parallel;
    self
  }

  pub fn with_continue_on_failure(mut self, continue_on_failure: bool) -> Self {
    self.continue_on_failure = continue_on_failure;
    self
  }
}

/// What happened to one child's condition during a single `next()` call.
#[derive(Debug, Clone)]
pub enum Evaluation {
  Matched,
  NotMatched,
  /// The condition could not be decided and the failure was tolerated.
  Failed(Arc<anyhow::Error>),
  /// Not evaluated because an earlier sibling already matched (sequential mode only).
  Skipped,
}

impl Evaluation {
  pub fn is_match(&self) -> bool {
    matches!(self, Evaluation::Matched)
  }

  pub fn error(&self) -> Option<&anyhow::Error> {
    match self {
      Evaluation::Failed(err) => Some(err),
      _ => None,
    }
  }
}

/// The branch chosen by a `next()` call.
#[derive(Debug, Clone, Copy)]
pub enum Branch<'a> {
  /// The lowest-index child whose condition matched.
  Matched { index: usize, node: &'a ChainNode },
  /// No child matched; the node's fallback was selected.
  Fallback(&'a ChainNode),
  /// No child matched and the node has no fallback.
  Unmatched,
}

/// Result of one `next()` call: the chosen branch plus every child's evaluation,
/// index-aligned with the node's children.
#[derive(Debug)]
pub struct Traversal<'a> {
  pub branch: Branch<'a>,
  pub evaluations: Vec<Evaluation>,
}

impl<'a> Traversal<'a> {
  /// The node to continue with, if any (a matched child or the fallback).
  pub fn selected(&self) -> Option<&'a ChainNode> {
    match self.branch {
      Branch::Matched { node, .. } => Some(node),
      Branch::Fallback(node) => Some(node),
      Branch::Unmatched => None,
    }
  }

  pub fn matched_index(&self) -> Option<usize> {
    match self.branch {
      Branch::Matched { index, .. } => Some(index),
      _ => None,
    }
  }

  pub fn is_unmatched(&self) -> bool {
    matches!(self.branch, Branch::Unmatched)
  }

  pub fn evaluation(&self, child_index: usize) -> Option<&Evaluation> {
    self.evaluations.get(child_index)
  }
}
