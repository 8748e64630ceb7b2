// src/lib.rs

//! reqchain: an ASYNC conditional dispatch tree for chains of outbound HTTP requests.
//!
//! reqchain lets you describe a decision tree of request groups ("chains"),
//! where every edge is guarded by a condition, and walk it at runtime:
//!  - `ChainNode::next()` selects exactly one matching child (lowest index wins),
//!    evaluating sibling conditions in order or concurrently.
//!  - Continue-on-failure policy decides whether an undecidable condition aborts
//!    traversal or merely counts as "did not match".
//!  - A `Chain` dispatches its requests sequentially or fans them out
//!    concurrently, always returning results aligned with its requests.
//!  - Each request may reshape its response body with a `Transformer`: a jq
//!    query, a pass-through, or an external process.
//!  - Sequential chains can pipe one result's body into the next request.

pub mod chain;
pub mod core;
pub mod error;
pub mod settings;
pub mod transform;
pub mod tree;

// --- Re-exports for the Public API ---

pub use crate::core::condition::{Condition, FnCondition, StaticCondition};
pub use crate::core::control::{Branch, Evaluation, Traversal, TraversalOptions};

pub use crate::chain::{
  Chain, ChainOutcome, ChainRequest, ChainResponse, HttpTransport, OutboundRequest, ReqwestTransport,
  ResponseWithError, TransportResponse,
};
pub use crate::tree::ChainNode;

pub use crate::transform::{QueryTransformer, ScriptTransformer, Transformer, TransformerKind};

pub use crate::error::{ChainError, ChainResult};
pub use crate::settings::Settings;

// Cancellation tokens are part of the transform signature.
pub use tokio_util::sync::CancellationToken;

/*
    Typical flow:
    1. Build a `Chain` per branch with an injected `HttpTransport` and `.add()` requests,
       optionally pairing each with an `Arc<Transformer>`.
    2. Wrap chains in `ChainNode`s with their guarding `Condition`s and assemble the tree
       (`with_child`, `with_fallback`), applying `Settings::traversal_options()`.
    3. Call `root.next().await` (or `root.walk().await`) to pick a branch.
    4. Run the selected node's chain with `run_sequentially()` or `run_concurrently()`.
*/
