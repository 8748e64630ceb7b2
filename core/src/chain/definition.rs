// reqchain/src/chain/definition.rs

//! Contains the `Chain` struct and the per-request descriptor `ChainRequest`,
//! plus methods for building and restructuring a chain.

use crate::chain::transport::{HttpTransport, OutboundRequest};
use crate::error::{ChainError, ChainResult};
use crate::transform::Transformer;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One outbound call within a chain.
#[derive(Debug, Clone)]
pub struct ChainRequest {
  pub request: OutboundRequest,
  /// Applied to the response body before it is returned or piped onward.
  pub transformer: Option<Arc<Transformer>>,
  /// Replace this request's body with the previous request's (transformed) body.
  /// Only honoured by `Chain::run_sequentially`.
  pub pipe_previous: bool,
  /// Position within the owning chain; kept in sync by `Chain::remove`.
  pub index: usize,
}

/// An ordered group of outbound calls executed together.
///
/// Results from either execution mode are index-aligned with `requests`.
pub struct Chain {
  pub(crate) name: String,
  pub(crate) requests: Vec<ChainRequest>,
  pub(crate) transport: Arc<dyn HttpTransport>,
  pub(crate) cancel: CancellationToken,
}

impl Chain {
  pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
    Self::named("chain", transport)
  }

  pub fn named(name: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
    Self {
      name: name.into(),
      requests: Vec::new(),
      transport,
      cancel: CancellationToken::new(),
    }
  }

  /// Token handed to every transform this chain runs. Dispatch itself ignores it.
  pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn add(&mut self, request: OutboundRequest, transformer: Option<Arc<Transformer>>) -> &mut Self {
    self.push(request, transformer, false)
  }

  /// Adds a request whose body is the previous request's result body.
  pub fn add_piped(&mut self, request: OutboundRequest, transformer: Option<Arc<Transformer>>) -> &mut Self {
    self.push(request, transformer, true)
  }

  fn push(&mut self, request: OutboundRequest, transformer: Option<Arc<Transformer>>, pipe_previous: bool) -> &mut Self {
    let index = self.requests.len();
    self.requests.push(ChainRequest {
      request,
      transformer,
      pipe_previous,
      index,
    });
    self
  }

  /// Sets (or replaces) the transformer of request `index`.
  pub fn append_transformer(&mut self, index: usize, transformer: Arc<Transformer>) -> ChainResult<()> {
    let len = self.requests.len();
    let request = self
      .requests
      .get_mut(index)
      .ok_or(ChainError::IndexOutOfRange { index, len })?;
    request.transformer = Some(transformer);
    Ok(())
  }

  /// Removes request `index`; later requests shift down and are re-indexed.
  pub fn remove(&mut self, index: usize) -> ChainResult<ChainRequest> {
    let len = self.requests.len();
    if index >= len {
      return Err(ChainError::IndexOutOfRange { index, len });
    }
    let removed = self.requests.remove(index);
    for (position, request) in self.requests.iter_mut().enumerate().skip(index) {
      request.index = position;
    }
    Ok(removed)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn requests(&self) -> &[ChainRequest] {
    &self.requests
  }

  pub fn len(&self) -> usize {
    self.requests.len()
  }

  pub fn is_empty(&self) -> bool {
    self.requests.is_empty()
  }
}

impl fmt::Debug for Chain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Chain")
      .field("name", &self.name)
      .field("requests", &self.requests)
      .finish_non_exhaustive()
  }
}
