// reqchain/src/settings.rs

//! Process-wide defaults for traversal and script execution.
//!
//! `Settings` is constructed once at the composition root and passed by value
//! into nodes (via [`Settings::traversal_options`]) and script transformers
//! (via [`Settings::script_timeout`]).

use crate::core::control::TraversalOptions;
use crate::error::ChainResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{event, Level};

/// Environment variable prefix read by [`Settings::load`], e.g. `REQCHAIN_CUSTOM_SCRIPT_TIMEOUT=5`.
pub const ENV_PREFIX: &str = "REQCHAIN";

/// Base name of the optional settings file read by [`Settings::load`] (`reqchain.toml`, `reqchain.yaml`, ...).
pub const DEFAULT_FILE: &str = "reqchain";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Evaluate sibling conditions concurrently instead of in order.
  pub run_parallel_condition_evaluations: bool,
  /// Treat a failing condition as "did not match" instead of aborting traversal.
  pub continue_failed_condition_evaluation: bool,
  /// Upper bound on an external script's lifetime, in seconds. `0` disables the bound.
  pub custom_script_timeout: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      run_parallel_condition_evaluations: false,
      continue_failed_condition_evaluation: false,
      custom_script_timeout: 30,
    }
  }
}

impl Settings {
  /// Defaults, then `override_fn` applied on top.
  pub fn new(override_fn: impl FnOnce(&mut Settings)) -> Self {
    let mut settings = Settings::default();
    override_fn(&mut settings);
    settings
  }

  /// Defaults, overlaid by an optional `reqchain.*` file in the working
  /// directory, overlaid by `REQCHAIN_*` environment variables.
  pub fn load() -> ChainResult<Self> {
    Self::load_layers(config::File::with_name(DEFAULT_FILE).required(false))
  }

  /// Like [`Settings::load`] but the file layer comes from `path`, which must exist.
  pub fn load_from(path: impl AsRef<Path>) -> ChainResult<Self> {
    Self::load_layers(config::File::from(path.as_ref()).required(true))
  }

  fn load_layers(file: impl config::Source + Send + Sync + 'static) -> ChainResult<Self> {
    let config = config::Config::builder()
      .add_source(file)
      .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
      .build()?;

    let settings: Settings = config.try_deserialize()?;
    event!(Level::DEBUG, ?settings, "Settings loaded.");
    Ok(settings)
  }

  pub fn traversal_options(&self) -> TraversalOptions {
    TraversalOptions {
      parallel_evaluation: self.run_parallel_condition_evaluations,
      continue_on_failure: self.continue_failed_condition_evaluation,
    }
  }

  pub fn script_timeout(&self) -> Option<Duration> {
    match self.custom_script_timeout {
      0 => None,
      secs => Some(Duration::from_secs(secs)),
    }
  }
}
