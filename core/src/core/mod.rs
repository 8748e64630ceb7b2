pub mod condition;
pub mod control;

pub use condition::{Condition, FnCondition, StaticCondition};
pub use control::{Branch, Evaluation, Traversal, TraversalOptions};
