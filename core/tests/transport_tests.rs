// tests/transport_tests.rs
mod common;

use common::*;
use pretty_assertions::assert_eq;
use reqchain::{
  Chain, ChainError, ChainNode, HttpTransport, OutboundRequest, ReqwestTransport, StaticCondition, Transformer,
  TraversalOptions,
};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_reqwest_transport_round_trip() {
  setup_tracing();
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/users"))
    .and(header("x-trace", "abc"))
    .and(body_string("payload"))
    .respond_with(ResponseTemplate::new(201).set_body_string("created"))
    .mount(&server)
    .await;

  let request = OutboundRequest::post(format!("{}/users", server.uri()), "payload")
    .with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("abc"));
  let response = ReqwestTransport::new().send(request).await.unwrap();

  assert_eq!(response.status, StatusCode::CREATED);
  assert_eq!(response.body, "created");
}

#[tokio::test]
async fn test_reqwest_transport_error_status_is_a_response() {
  setup_tracing();
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(503))
    .mount(&server)
    .await;

  let response = ReqwestTransport::new()
    .send(OutboundRequest::get(server.uri()))
    .await
    .unwrap();
  assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_reqwest_transport_timeout_is_a_dispatch_error() {
  setup_tracing();
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
    .mount(&server)
    .await;

  let transport = Arc::new(ReqwestTransport::new().with_timeout(Duration::from_millis(50)));
  let mut chain = Chain::new(transport);
  chain.add(OutboundRequest::get(server.uri()), None);

  let outcome = chain.run_sequentially().await;
  assert!(matches!(outcome.get(0), Some(Err(ChainError::Dispatch { index: 0, .. }))));
}

#[tokio::test]
async fn test_tree_over_real_http() {
  setup_tracing();
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/profile"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
      "user": {"name": "ada", "roles": ["admin"]}
    })))
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/audit"))
    .respond_with(ResponseTemplate::new(200).set_body_string("logged"))
    .expect(0)
    .mount(&server)
    .await;

  let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
  let mut profile = Chain::named("profile", transport.clone());
  profile.add(
    OutboundRequest::get(format!("{}/profile", server.uri())),
    Some(Arc::new(Transformer::query("{name: .user.name, admin: (.user.roles | map(select(. == \"admin\")) | length > 0)}"))),
  );
  let mut audit = Chain::named("audit", transport.clone());
  audit.add(OutboundRequest::post(format!("{}/audit", server.uri()), "{}"), None);

  let root = ChainNode::root(Chain::named("root", transport), TraversalOptions::default()).with_children([
    ChainNode::new(audit, Arc::new(StaticCondition::never())),
    ChainNode::new(profile, Arc::new(StaticCondition::always())),
  ]);

  let traversal = root.next().await.unwrap();
  let outcome = traversal.selected().unwrap().chain().run_sequentially().await;
  let body = &outcome.get(0).unwrap().as_ref().unwrap().body;
  assert_eq!(json(body), serde_json::json!({"name": "ada", "admin": true}));
}
