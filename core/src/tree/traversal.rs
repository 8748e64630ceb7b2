// reqchain/src/tree/traversal.rs

//! Contains `ChainNode::next()`, the branch selection algorithm, and
//! `ChainNode::walk()`, which follows it down the tree.

use crate::core::control::{Branch, Evaluation, Traversal};
use crate::error::{ChainError, ChainResult};
use crate::tree::node::ChainNode;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{event, instrument, Instrument, Level};

/// Index of the selected child (if any) plus every child's evaluation.
type Scan = (Option<usize>, Vec<Evaluation>);

impl ChainNode {
  /// Evaluates the children's conditions and selects the lowest-index match.
  ///
  /// Sequential mode evaluates in order and stops at the first match; parallel
  /// mode evaluates every child on its own task and decides after all of them
  /// finish (siblings are never cancelled early). In both modes a failing
  /// condition aborts with `ChainError::ConditionEvaluation` unless
  /// `continue_on_failure` is set, in which case it counts as "did not match".
  ///
  /// When nothing matches, the branch is `Branch::Fallback` if the node has a
  /// fallback and `Branch::Unmatched` otherwise.
  #[instrument(
    name = "ChainNode::next",
    skip_all,
    fields(
      chain = %self.chain.name(),
      num_children = self.children.len(),
      parallel = self.options.parallel_evaluation,
      continue_on_failure = self.options.continue_on_failure,
    ),
    err(Display)
  )]
  pub async fn next(&self) -> ChainResult<Traversal<'_>> {
    let (selected, evaluations) = if self.options.parallel_evaluation {
      self.evaluate_in_parallel().await?
    } else {
      self.evaluate_in_order().await?
    };

    let branch = match (selected, self.fallback.as_deref()) {
      (Some(index), _) => {
        event!(Level::DEBUG, index, chain = %self.children[index].chain.name(), "Child condition matched.");
        Branch::Matched {
          index,
          node: &self.children[index],
        }
      }
      (None, Some(fallback)) => {
        event!(Level::DEBUG, chain = %fallback.chain.name(), "No child matched; using fallback.");
        Branch::Fallback(fallback)
      }
      (None, None) => {
        event!(Level::DEBUG, "No child matched.");
        Branch::Unmatched
      }
    };

    Ok(Traversal { branch, evaluations })
  }

  /// Follows `next()` from this node until a leaf is reached or nothing
  /// matches. The returned path starts with `self`.
  pub async fn walk(&self) -> ChainResult<Vec<&ChainNode>> {
    let mut path = vec![self];
    let mut current = self;

    while !current.is_leaf() {
      match current.next().await?.selected() {
        Some(node) => {
          path.push(node);
          current = node;
        }
        None => break,
      }
    }

    event!(Level::DEBUG, depth = path.len(), "Walk finished.");
    Ok(path)
  }

  async fn evaluate_in_order(&self) -> ChainResult<Scan> {
    let mut evaluations = vec![Evaluation::Skipped; self.children.len()];

    for (index, child) in self.children.iter().enumerate() {
      match child.condition.evaluate().await {
        Ok(true) => {
          evaluations[index] = Evaluation::Matched;
          return Ok((Some(index), evaluations));
        }
        Ok(false) => evaluations[index] = Evaluation::NotMatched,
        Err(source) => evaluations[index] = self.tolerate(index, source)?,
      }
    }

    Ok((None, evaluations))
  }

  async fn evaluate_in_parallel(&self) -> ChainResult<Scan> {
    // One task per child so a condition that blocks cannot stall its siblings.
    let handles: Vec<_> = self
      .children
      .iter()
      .map(|child| {
        let condition = Arc::clone(&child.condition);
        tokio::spawn(async move { condition.evaluate().await }.in_current_span())
      })
      .collect();
    let results = join_all(handles).await;

    let mut selected = None;
    let mut evaluations = Vec::with_capacity(results.len());

    for (index, joined) in results.into_iter().enumerate() {
      let result =
        joined.unwrap_or_else(|err| Err(anyhow::Error::new(err).context("condition task did not complete")));
      let evaluation = match result {
        Ok(true) => {
          selected.get_or_insert(index);
          Evaluation::Matched
        }
        Ok(false) => Evaluation::NotMatched,
        // A failure after the winning child cannot change the decision.
        Err(source) if selected.is_some() => Evaluation::Failed(Arc::new(source)),
        Err(source) => self.tolerate(index, source)?,
      };
      evaluations.push(evaluation);
    }

    Ok((selected, evaluations))
  }

  fn tolerate(&self, child_index: usize, source: anyhow::Error) -> ChainResult<Evaluation> {
    if !self.options.continue_on_failure {
      event!(Level::ERROR, child_index, error = %source, "Condition evaluation failed; aborting traversal.");
      return Err(ChainError::ConditionEvaluation { child_index, source });
    }
    event!(Level::WARN, child_index, error = %source, "Condition evaluation failed; treating as no match.");
    Ok(Evaluation::Failed(Arc::new(source)))
  }
}
