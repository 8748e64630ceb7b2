// reqchain/src/transform/mod.rs

//! Body-reshaping steps applied to each response before it is returned or
//! piped into the next request.
//!
//! `Transformer` is a closed set of variants; adding one is a compile-checked
//! change to [`Transformer::transform`]. Transformers are usually shared
//! between requests behind an `Arc`.

pub mod query;
pub mod script;

pub use query::QueryTransformer;
pub use script::ScriptTransformer;

use crate::error::{ChainError, ChainResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformerKind {
  Nil,
  #[serde(rename = "jq")]
  Query,
  Script,
}

#[derive(Debug, Clone)]
pub enum Transformer {
  /// Passes the body through unchanged.
  Nil,
  /// Extracts a single value with a jq query.
  Query(QueryTransformer),
  /// Pipes the body through an external process.
  Script(ScriptTransformer),
}

impl Transformer {
  pub fn nil() -> Self {
    Transformer::Nil
  }

  pub fn query(query: impl Into<String>) -> Self {
    Transformer::Query(QueryTransformer::new(query))
  }

  pub fn script<I, S>(program: impl Into<String>, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Transformer::Script(ScriptTransformer::new(program, args))
  }

  pub fn kind(&self) -> TransformerKind {
    match self {
      Transformer::Nil => TransformerKind::Nil,
      Transformer::Query(_) => TransformerKind::Query,
      Transformer::Script(_) => TransformerKind::Script,
    }
  }

  /// Reshapes `body`. Output is all-or-nothing: on error no partial body is returned.
  #[instrument(
    name = "Transformer::transform",
    skip_all,
    fields(kind = ?self.kind(), input_len = body.len()),
    err(Display)
  )]
  pub async fn transform(&self, cancel: &CancellationToken, body: Bytes) -> ChainResult<Bytes> {
    if cancel.is_cancelled() {
      event!(Level::DEBUG, "Cancellation requested before transform started.");
      return Err(ChainError::Cancelled);
    }

    let output = match self {
      Transformer::Nil => body,
      Transformer::Query(query) => query.apply(&body)?,
      Transformer::Script(script) => script.run(cancel, body).await?,
    };

    event!(Level::TRACE, output_len = output.len(), "Transform finished.");
    Ok(output)
  }
}

impl From<QueryTransformer> for Transformer {
  fn from(query: QueryTransformer) -> Self {
    Transformer::Query(query)
  }
}

impl From<ScriptTransformer> for Transformer {
  fn from(script: ScriptTransformer) -> Self {
    Transformer::Script(script)
  }
}
