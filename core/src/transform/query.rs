// reqchain/src/transform/query.rs

//! jq extraction backed by the jaq engine.

use crate::error::{ChainError, ChainResult};
use bytes::Bytes;
use jaq_core::load::{Arena, File, Loader};
use jaq_core::{Compiler, Ctx, Native, RcIter};
use jaq_json::Val;
use tracing::{event, Level};

type Filter = jaq_core::Filter<Native<Val>>;

/// Runs a jq query against a single JSON document and yields at most one value.
///
/// A string result is returned as its raw text (`.foo` on `{"foo":"bar"}`
/// gives `bar`, not `"bar"`); any other value is returned as compact JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTransformer {
  query: String,
}

impl QueryTransformer {
  pub fn new(query: impl Into<String>) -> Self {
    Self { query: query.into() }
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  /// Parses and compiles the query without running it.
  pub fn validate(&self) -> ChainResult<()> {
    self.compile().map(|_| ())
  }

  fn compile(&self) -> ChainResult<Filter> {
    let program = File {
      code: self.query.as_str(),
      path: (),
    };
    let loader = Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = Arena::default();

    let modules = loader.load(&arena, program).map_err(|errs| ChainError::QueryParse {
      query: self.query.clone(),
      message: format!("{:?}", errs),
    })?;

    Compiler::default()
      .with_funs(jaq_std::funs().chain(jaq_json::funs()))
      .compile(modules)
      .map_err(|errs| ChainError::QueryParse {
        query: self.query.clone(),
        message: format!("{:?}", errs),
      })
  }

  /// The whole extraction is synchronous; jaq values are not `Send`, so they
  /// never outlive this call.
  pub(crate) fn apply(&self, body: &[u8]) -> ChainResult<Bytes> {
    let filter = self.compile()?;
    let input: serde_json::Value = serde_json::from_slice(body)?;

    let inputs = RcIter::new(std::iter::empty());
    let mut results = filter.run((Ctx::new([], &inputs), Val::from(input)));

    let value = match results.next() {
      None => {
        event!(Level::DEBUG, query = %self.query, "jq query produced no result.");
        return Ok(Bytes::new());
      }
      Some(Err(err)) => {
        return Err(ChainError::QueryEvaluation {
          query: self.query.clone(),
          message: err.to_string(),
        })
      }
      Some(Ok(value)) => value,
    };

    if results.next().is_some() {
      event!(Level::WARN, query = %self.query, "jq query produced more than one result.");
      return Err(ChainError::MultipleResults {
        query: self.query.clone(),
      });
    }

    let rendered = match value {
      Val::Str(text) => text.as_str().to_owned(),
      other => other.to_string(),
    };
    Ok(Bytes::from(rendered))
  }
}
