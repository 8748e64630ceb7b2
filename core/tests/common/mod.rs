// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqchain::{Chain, ChainNode, Condition, HttpTransport, OutboundRequest, TransportResponse};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;
use tracing::Level;

// --- Test Conditions ---

/// Condition with a fixed answer or error, an optional delay and an evaluation counter.
#[derive(Default)]
pub struct TestCondition {
  pub return_value: bool,
  pub error: Option<&'static str>,
  pub delay: Option<Duration>,
  pub evaluations: AtomicUsize,
}

impl TestCondition {
  pub fn matching() -> Arc<Self> {
    Arc::new(Self {
      return_value: true,
      ..Default::default()
    })
  }

  pub fn not_matching() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn failing(message: &'static str) -> Arc<Self> {
    Arc::new(Self {
      error: Some(message),
      ..Default::default()
    })
  }

  pub fn delayed(return_value: bool, delay: Duration) -> Arc<Self> {
    Arc::new(Self {
      return_value,
      delay: Some(delay),
      ..Default::default()
    })
  }

  pub fn evaluation_count(&self) -> usize {
    self.evaluations.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Condition for TestCondition {
  async fn evaluate(&self) -> anyhow::Result<bool> {
    self.evaluations.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    match self.error {
      Some(message) => Err(anyhow::anyhow!(message)),
      None => Ok(self.return_value),
    }
  }
}

// --- Test Transport ---

/// In-memory transport. Routing is by URL path:
/// - `/echo`        responds 200 with the request body
/// - `/fail...`     fails to dispatch
/// - `/delay/{ms}`  sleeps, then responds 200 with `delayed {ms}`
/// - `/status/{n}`  responds with status `n` and an empty body
/// - anything else  responds 200 with the URL as body
#[derive(Default)]
pub struct MockTransport {
  pub sent: Mutex<Vec<OutboundRequest>>,
  in_flight: AtomicUsize,
  pub max_in_flight: AtomicUsize,
}

impl MockTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn sent_urls(&self) -> Vec<String> {
    self.sent.lock().iter().map(|r| r.url.clone()).collect()
  }

  pub fn sent_bodies(&self) -> Vec<Bytes> {
    self.sent.lock().iter().map(|r| r.body.clone()).collect()
  }

  pub fn peak_concurrency(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }

  async fn respond(&self, request: &OutboundRequest) -> anyhow::Result<TransportResponse> {
    let path = request
      .url
      .split_once("://")
      .and_then(|(_, rest)| rest.find('/').map(|at| &rest[at..]))
      .unwrap_or("/")
      .to_string();

    if path.starts_with("/fail") {
      anyhow::bail!("connection refused: {}", request.url);
    }
    if path == "/echo" {
      return Ok(ok(request.body.clone()));
    }
    if let Some(ms) = path.strip_prefix("/delay/") {
      let ms: u64 = ms.parse()?;
      tokio::time::sleep(Duration::from_millis(ms)).await;
      return Ok(ok(Bytes::from(format!("delayed {ms}"))));
    }
    if let Some(code) = path.strip_prefix("/status/") {
      return Ok(TransportResponse {
        status: StatusCode::from_u16(code.parse()?)?,
        headers: HeaderMap::new(),
        body: Bytes::new(),
      });
    }
    Ok(ok(Bytes::from(request.url.clone())))
  }
}

fn ok(body: Bytes) -> TransportResponse {
  TransportResponse {
    status: StatusCode::OK,
    headers: HeaderMap::new(),
    body,
  }
}

#[async_trait]
impl HttpTransport for MockTransport {
  async fn send(&self, request: OutboundRequest) -> anyhow::Result<TransportResponse> {
    self.sent.lock().push(request.clone());
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    let response = self.respond(&request).await;

    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
  }
}

// --- Tree helpers ---

pub fn named_chain(name: &str) -> Chain {
  Chain::named(name, MockTransport::new())
}

pub fn leaf(name: &str, condition: Arc<dyn Condition>) -> ChainNode {
  ChainNode::new(named_chain(name), condition)
}

/// `jq` is only needed by the cross-variant equivalence tests.
pub fn jq_available() -> bool {
  std::process::Command::new("jq")
    .arg("--version")
    .output()
    .map(|out| out.status.success())
    .unwrap_or(false)
}

pub fn json(bytes: &[u8]) -> serde_json::Value {
  serde_json::from_slice(bytes).expect("output should be valid JSON")
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
