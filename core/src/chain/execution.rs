// reqchain/src/chain/execution.rs

//! Contains `Chain::run_sequentially()` and `Chain::run_concurrently()`.
//! Both return one result per request, aligned by index with `Chain::requests`.

use crate::chain::definition::{Chain, ChainRequest};
use crate::chain::transport::HttpTransport;
use crate::error::{ChainError, ChainResult};
use bytes::Bytes;
use futures::future::join_all;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Instrument, Level};

/// One successful call: the response with its (transformed) body.
#[derive(Debug, Clone)]
pub struct ChainResponse {
  pub index: usize,
  pub status: StatusCode,
  pub headers: HeaderMap,
  pub body: Bytes,
}

/// One call's outcome.
pub type ResponseWithError = ChainResult<ChainResponse>;

/// All outcomes of a chain run; slot `i` belongs to request `i`.
#[derive(Debug)]
pub struct ChainOutcome {
  responses: Vec<ResponseWithError>,
}

impl ChainOutcome {
  pub fn len(&self) -> usize {
    self.responses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.responses.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&ResponseWithError> {
    self.responses.get(index)
  }

  pub fn iter(&self) -> impl Iterator<Item = &ResponseWithError> {
    self.responses.iter()
  }

  pub fn successes(&self) -> impl Iterator<Item = &ChainResponse> {
    self.responses.iter().filter_map(|r| r.as_ref().ok())
  }

  pub fn failures(&self) -> impl Iterator<Item = &ChainError> {
    self.responses.iter().filter_map(|r| r.as_ref().err())
  }

  pub fn is_all_ok(&self) -> bool {
    self.responses.iter().all(Result::is_ok)
  }

  pub fn into_inner(self) -> Vec<ResponseWithError> {
    self.responses
  }
}

impl Chain {
  /// Dispatches requests strictly in order. A failed request does not stop
  /// the ones after it, except that a piped request whose predecessor failed
  /// is not dispatched.
  #[instrument(
    name = "Chain::run_sequentially",
    skip_all,
    fields(chain = %self.name, num_requests = self.requests.len())
  )]
  pub async fn run_sequentially(&self) -> ChainOutcome {
    let mut responses: Vec<ResponseWithError> = Vec::with_capacity(self.requests.len());

    for request in &self.requests {
      if request.pipe_previous && matches!(responses.last(), Some(Err(_))) {
        event!(Level::WARN, index = request.index, "Previous request failed; piped request not dispatched.");
        responses.push(Err(ChainError::PreviousFailed { index: request.index }));
        continue;
      }

      let piped_body = match responses.last() {
        Some(Ok(previous)) if request.pipe_previous => Some(previous.body.clone()),
        _ => None,
      };

      let outcome = Call::for_request(self, request).execute(piped_body).await;
      responses.push(outcome);
    }

    event!(Level::DEBUG, "Sequential chain run finished.");
    ChainOutcome { responses }
  }

  /// Dispatches every request at once, each on its own task, and waits for all of them.
  /// Piped requests need their predecessor's result and fail in their slot.
  #[instrument(
    name = "Chain::run_concurrently",
    skip_all,
    fields(chain = %self.name, num_requests = self.requests.len())
  )]
  pub async fn run_concurrently(&self) -> ChainOutcome {
    // One task per request so a slow transport or transform cannot hold up the rest.
    let handles: Vec<_> = self
      .requests
      .iter()
      .map(|request| {
        let index = request.index;
        let piped = request.pipe_previous && index > 0;
        let call = Call::for_request(self, request);
        tokio::spawn(
          async move {
            if piped {
              return Err(ChainError::PipeRequiresSequential { index });
            }
            call.execute(None).await
          }
          .in_current_span(),
        )
      })
      .collect();

    let responses = join_all(handles)
      .await
      .into_iter()
      .zip(&self.requests)
      .map(|(joined, request)| {
        joined.unwrap_or_else(|err| {
          Err(ChainError::Dispatch {
            index: request.index,
            source: anyhow::Error::new(err).context("request task did not complete"),
          })
        })
      })
      .collect();

    event!(Level::DEBUG, "Concurrent chain run finished.");
    ChainOutcome { responses }
  }
}

/// Everything one request needs, owned so it can run on its own task.
struct Call {
  transport: Arc<dyn HttpTransport>,
  cancel: CancellationToken,
  request: ChainRequest,
}

impl Call {
  fn for_request(chain: &Chain, request: &ChainRequest) -> Self {
    Self {
      transport: Arc::clone(&chain.transport),
      cancel: chain.cancel.clone(),
      request: request.clone(),
    }
  }

  async fn execute(self, piped_body: Option<Bytes>) -> ResponseWithError {
    let Call {
      transport,
      cancel,
      request,
    } = self;
    let index = request.index;
    let mut outbound = request.request;
    if let Some(body) = piped_body {
      outbound.body = body;
    }

    let response = transport.send(outbound).await.map_err(|source| {
      event!(Level::ERROR, index, error = %source, "Request dispatch failed.");
      ChainError::Dispatch { index, source }
    })?;

    let body = match &request.transformer {
      Some(transformer) => transformer
        .transform(&cancel, response.body)
        .await
        .map_err(|err| ChainError::Transform {
          index,
          source: Box::new(err),
        })?,
      None => response.body,
    };

    event!(Level::TRACE, index, status = %response.status, "Request completed.");
    Ok(ChainResponse {
      index,
      status: response.status,
      headers: response.headers,
      body,
    })
  }
}
