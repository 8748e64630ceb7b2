// reqchain/src/core/condition.rs

//! The `Condition` capability guarding each branch of the dispatch tree.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A predicate deciding whether a branch applies.
///
/// `Ok(false)` means "did not match". `Err(_)` means the condition could not be
/// decided at all, which traversal treats as fatal unless continue-on-failure
/// is set. Implementations may perform I/O (e.g. inspect a previous response).
#[async_trait]
pub trait Condition: Send + Sync {
  async fn evaluate(&self) -> anyhow::Result<bool>;
}

/// A condition with a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCondition(pub bool);

impl StaticCondition {
  pub fn always() -> Self {
    StaticCondition(true)
  }

  pub fn never() -> Self {
    StaticCondition(false)
  }
}

#[async_trait]
impl Condition for StaticCondition {
  async fn evaluate(&self) -> anyhow::Result<bool> {
    Ok(self.0)
  }
}

/// Adapts a synchronous closure into a `Condition`.
#[derive(Clone)]
pub struct FnCondition(Arc<dyn Fn() -> anyhow::Result<bool> + Send + Sync + 'static>);

impl FnCondition {
  pub fn new(predicate: impl Fn() -> anyhow::Result<bool> + Send + Sync + 'static) -> Self {
    FnCondition(Arc::new(predicate))
  }
}

impl fmt::Debug for FnCondition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("FnCondition(..)")
  }
}

#[async_trait]
impl Condition for FnCondition {
  async fn evaluate(&self) -> anyhow::Result<bool> {
    (self.0)()
  }
}
