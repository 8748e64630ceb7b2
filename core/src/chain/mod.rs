// reqchain/src/chain/mod.rs

//! Defines `Chain`, its request descriptors, the two execution modes and the
//! HTTP transport it dispatches through.

pub mod definition;
pub mod execution;
pub mod transport;

pub use definition::{Chain, ChainRequest};
pub use execution::{ChainOutcome, ChainResponse, ResponseWithError};
pub use transport::{HttpTransport, OutboundRequest, ReqwestTransport, TransportResponse};
