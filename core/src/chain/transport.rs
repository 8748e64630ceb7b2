// reqchain/src/chain/transport.rs

//! The HTTP collaborator a `Chain` dispatches through.
//!
//! Transports are injected into each chain at construction, so tests can swap
//! in doubles and chains can carry their own client configuration.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::{event, Level};

/// A cloneable description of one outbound call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
  pub method: Method,
  pub url: String,
  pub headers: HeaderMap,
  pub body: Bytes,
}

impl OutboundRequest {
  pub fn new(method: Method, url: impl Into<String>) -> Self {
    Self {
      method,
      url: url.into(),
      headers: HeaderMap::new(),
      body: Bytes::new(),
    }
  }

  pub fn get(url: impl Into<String>) -> Self {
    Self::new(Method::GET, url)
  }

  pub fn post(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
    Self::new(Method::POST, url).with_body(body)
  }

  pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
    self.body = body.into();
    self
  }

  pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
    self.headers.insert(name, value);
    self
  }
}

/// What a transport hands back. Non-2xx statuses are responses, not errors.
#[derive(Debug, Clone)]
pub struct TransportResponse {
  pub status: StatusCode,
  pub headers: HeaderMap,
  pub body: Bytes,
}

/// "Do a request, get a response or an error."
#[async_trait]
pub trait HttpTransport: Send + Sync {
  async fn send(&self, request: OutboundRequest) -> anyhow::Result<TransportResponse>;
}

/// The default transport, backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
  client: reqwest::Client,
  timeout: Option<Duration>,
}

impl ReqwestTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_client(client: reqwest::Client) -> Self {
    Self { client, timeout: None }
  }

  /// Bounds each request, from connect to the end of the body.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
  async fn send(&self, request: OutboundRequest) -> anyhow::Result<TransportResponse> {
    event!(Level::TRACE, method = %request.method, url = %request.url, "Sending request.");

    let mut builder = self
      .client
      .request(request.method, &request.url)
      .headers(request.headers)
      .body(request.body);
    if let Some(timeout) = self.timeout {
      builder = builder.timeout(timeout);
    }

    let response = builder.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    event!(Level::TRACE, %status, body_len = body.len(), "Response received.");
    Ok(TransportResponse { status, headers, body })
  }
}
