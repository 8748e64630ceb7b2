// reqchain/src/tree/node.rs

//! Contains the `ChainNode` struct and methods for building and restructuring
//! the dispatch tree.

use crate::chain::Chain;
use crate::core::condition::{Condition, StaticCondition};
use crate::core::control::TraversalOptions;
use std::fmt;
use std::sync::Arc;

/// A vertex of the dispatch tree.
///
/// A node owns its chain, the condition guarding it, its children (in
/// priority order) and an optional fallback used when no child matches.
/// Ownership is strictly top-down. Traversal never mutates the tree, so a
/// tree can be shared (e.g. behind an `Arc`) and traversed concurrently.
pub struct ChainNode {
  pub(crate) chain: Chain,
  pub(crate) condition: Arc<dyn Condition>,
  pub(crate) children: Vec<ChainNode>,
  pub(crate) fallback: Option<Box<ChainNode>>,
  pub(crate) options: TraversalOptions,
}

impl ChainNode {
  pub fn new(chain: Chain, condition: Arc<dyn Condition>) -> Self {
    Self {
      chain,
      condition,
      children: Vec::new(),
      fallback: None,
      options: TraversalOptions::default(),
    }
  }

  /// A node whose own condition always matches; typical for the tree root.
  pub fn root(chain: Chain, options: TraversalOptions) -> Self {
    Self::new(chain, Arc::new(StaticCondition::always())).with_options(options)
  }

  pub fn with_children(mut self, children: impl IntoIterator<Item = ChainNode>) -> Self {
    self.children.extend(children);
    self
  }

  pub fn with_child(mut self, child: ChainNode) -> Self {
    self.children.push(child);
    self
  }

  pub fn with_fallback(mut self, fallback: ChainNode) -> Self {
    self.fallback = Some(Box::new(fallback));
    self
  }

  pub fn with_options(mut self, options: TraversalOptions) -> Self {
    self.options = options;
    self
  }

  pub fn push_child(&mut self, child: ChainNode) {
    self.children.push(child);
  }

  pub fn set_condition(&mut self, condition: Arc<dyn Condition>) {
    self.condition = condition;
  }

  pub fn set_options(&mut self, options: TraversalOptions) {
    self.options = options;
  }

  pub fn chain(&self) -> &Chain {
    &self.chain
  }

  pub fn chain_mut(&mut self) -> &mut Chain {
    &mut self.chain
  }

  pub fn condition(&self) -> &Arc<dyn Condition> {
    &self.condition
  }

  pub fn children(&self) -> &[ChainNode] {
    &self.children
  }

  pub fn child(&self, index: usize) -> Option<&ChainNode> {
    self.children.get(index)
  }

  pub fn child_mut(&mut self, index: usize) -> Option<&mut ChainNode> {
    self.children.get_mut(index)
  }

  pub fn fallback(&self) -> Option<&ChainNode> {
    self.fallback.as_deref()
  }

  pub fn options(&self) -> TraversalOptions {
    self.options
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }
}

impl fmt::Debug for ChainNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChainNode")
      .field("chain", &self.chain.name())
      .field("children", &self.children)
      .field("fallback", &self.fallback)
      .field("options", &self.options)
      .finish_non_exhaustive()
  }
}
