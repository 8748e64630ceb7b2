// reqchain/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
  /// A child's condition could not be decided and failures are not tolerated.
  #[error("Condition of child {child_index} failed to evaluate: {source}")]
  ConditionEvaluation {
    child_index: usize,
    #[source]
    source: AnyhowError,
  },

  #[error("Invalid jq query '{query}': {message}")]
  QueryParse { query: String, message: String },

  #[error("jq query '{query}' failed: {message}")]
  QueryEvaluation { query: String, message: String },

  #[error("jq query '{query}' returned more than one result")]
  MultipleResults { query: String },

  #[error("Transform input is not a single JSON document: {0}")]
  InvalidJson(#[from] serde_json::Error),

  #[error("Failed to start '{program}': {source}")]
  ProcessStart {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("'{program}' wrote to stderr: {stderr}")]
  ProcessStderr { program: String, stderr: String },

  /// `code` is `None` when the process was terminated by a signal.
  #[error("'{program}' exited unsuccessfully (code {code:?})")]
  ProcessExit { program: String, code: Option<i32> },

  #[error("'{program}' did not finish within {timeout_secs:.3}s")]
  ProcessTimeout { program: String, timeout_secs: f64 },

  #[error("I/O error while talking to '{program}': {source}")]
  Io {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Transform was cancelled")]
  Cancelled,

  #[error("Request {index} could not be dispatched: {source}")]
  Dispatch {
    index: usize,
    #[source]
    source: AnyhowError,
  },

  #[error("Transform of request {index} failed: {source}")]
  Transform {
    index: usize,
    #[source]
    source: Box<ChainError>,
  },

  #[error("Request {index} pipes the previous result, which failed")]
  PreviousFailed { index: usize },

  #[error("Request {index} pipes the previous result and cannot run concurrently")]
  PipeRequiresSequential { index: usize },

  #[error("No request at index {index} (chain has {len})")]
  IndexOutOfRange { index: usize, len: usize },

  #[error("Configuration error: {0}")]
  Configuration(#[from] config::ConfigError),
}

pub type ChainResult<T, E = ChainError> = std::result::Result<T, E>;
