// reqchain/examples/dispatch_tree.rs

use async_trait::async_trait;
use bytes::Bytes;
use reqchain::{
  Chain, ChainError, ChainNode, FnCondition, HttpTransport, OutboundRequest, Settings, StaticCondition, Transformer,
  TransportResponse,
};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

// --- An offline transport so the example runs anywhere ---
struct CannedTransport;

#[async_trait]
impl HttpTransport for CannedTransport {
  async fn send(&self, request: OutboundRequest) -> anyhow::Result<TransportResponse> {
    let body = if request.url.ends_with("/inventory") {
      Bytes::from_static(br#"{"items":[{"sku":"a-1","stock":0},{"sku":"b-2","stock":9}]}"#)
    } else {
      request.body
    };
    Ok(TransportResponse {
      status: StatusCode::OK,
      headers: HeaderMap::new(),
      body,
    })
  }
}

#[tokio::main]
async fn main() -> Result<(), ChainError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Conditional Dispatch Tree Example ---");

  let settings = Settings::load()?;
  let transport: Arc<dyn HttpTransport> = Arc::new(CannedTransport);

  // Branch A: restock report. Extract the out-of-stock SKUs, then post them onward.
  let mut restock = Chain::named("restock", transport.clone());
  restock
    .add(
      OutboundRequest::get("http://inventory.local/inventory"),
      Some(Arc::new(Transformer::query("[.items[] | select(.stock == 0) | .sku]"))),
    )
    .add_piped(OutboundRequest::post("http://purchasing.local/reorder", ""), None);

  // Branch B: nothing to do.
  let mut idle = Chain::named("idle", transport.clone());
  idle.add(OutboundRequest::get("http://inventory.local/ping"), None);

  let maintenance_window = Arc::new(AtomicBool::new(false));
  let window = maintenance_window.clone();

  let root = ChainNode::root(Chain::named("root", transport.clone()), settings.traversal_options())
    .with_child(ChainNode::new(
      restock,
      Arc::new(FnCondition::new(move || Ok(!window.load(Ordering::SeqCst)))),
    ))
    .with_fallback(ChainNode::new(idle, Arc::new(StaticCondition::always())));

  for in_window in [false, true] {
    maintenance_window.store(in_window, Ordering::SeqCst);
    let traversal = root.next().await?;
    let Some(selected) = traversal.selected() else {
      info!("No branch selected.");
      continue;
    };

    info!("Selected branch '{}'.", selected.chain().name());
    let outcome = selected.chain().run_sequentially().await;
    for result in outcome.iter() {
      match result {
        Ok(response) => info!(
          "  [{}] {} -> {}",
          response.index,
          response.status,
          String::from_utf8_lossy(&response.body)
        ),
        Err(err) => info!("  failed: {}", err),
      }
    }
  }

  Ok(())
}
